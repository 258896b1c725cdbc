//! Use sites of local variables and fields.

use super::host::{JavaHost, SyntaxNode};
use crate::error::TraceError;

impl<'c> JavaHost<'c> {
    pub(crate) fn references_of(
        &self,
        declarator: SyntaxNode<'c>,
    ) -> Result<Vec<SyntaxNode<'c>>, TraceError> {
        if declarator.kind() != "variable_declarator" {
            return Err(TraceError::stale(format!(
                "{} is not a variable declarator",
                declarator.kind()
            )));
        }
        let name = self
            .field_text(declarator, "name")
            .ok_or_else(|| TraceError::stale("declarator without a name"))?;
        let declaration = declarator
            .parent_node()
            .ok_or_else(|| TraceError::stale(format!("detached declarator '{name}'")))?;

        match declaration.kind() {
            "local_variable_declaration" => {
                let scope = declaration
                    .parent_node()
                    .ok_or_else(|| TraceError::stale(format!("local '{name}' without scope")))?;
                Ok(self.local_references(scope, declarator, name))
            }
            "field_declaration" | "constant_declaration" => {
                Ok(self.field_references(declaration, declarator, name))
            }
            other => Err(TraceError::stale(format!("'{name}' declared in {other}"))),
        }
    }

    /// Names in `scope` after the declaration that bind to `declarator`.
    fn local_references(
        &self,
        scope: SyntaxNode<'c>,
        declarator: SyntaxNode<'c>,
        name: &str,
    ) -> Vec<SyntaxNode<'c>> {
        let after = declarator.node.end_byte();
        let mut found = Vec::new();
        self.visit(scope, &mut |node| {
            if node.node.start_byte() >= after && self.names_binding(node, name, declarator) {
                found.push(node);
            }
        });
        found
    }

    /// Every expression in the corpus that reads the field.
    fn field_references(
        &self,
        declaration: SyntaxNode<'c>,
        declarator: SyntaxNode<'c>,
        name: &str,
    ) -> Vec<SyntaxNode<'c>> {
        let owner = self
            .enclosing_classes(declaration)
            .into_iter()
            .next()
            .and_then(|class| self.class_fqn(class));

        let mut found = Vec::new();
        for (id, file) in self.corpus.files().iter().enumerate() {
            if !file.source.contains(name) {
                continue;
            }
            let imported = owner
                .as_deref()
                .is_some_and(|owner| file.imports_static(owner, name));
            let root = SyntaxNode {
                file: id,
                node: file.root(),
            };
            self.visit(root, &mut |node| match node.kind() {
                "identifier" if self.text(node) == name && self.is_expression_name(node) => {
                    match self.lookup(node, name) {
                        Some(binding) if binding.declarator == declarator => found.push(node),
                        None if imported => found.push(node),
                        _ => {}
                    }
                }
                "field_access" if self.field_text(node, "field") == Some(name) => {
                    if self
                        .qualified_field(node)
                        .is_some_and(|binding| binding.declarator == declarator)
                    {
                        found.push(node);
                    }
                }
                _ => {}
            });
        }
        found
    }

    fn names_binding(&self, node: SyntaxNode<'c>, name: &str, declarator: SyntaxNode<'c>) -> bool {
        node.kind() == "identifier"
            && self.text(node) == name
            && self.is_expression_name(node)
            && self
                .lookup(node, name)
                .is_some_and(|binding| binding.declarator == declarator)
    }

    /// Pre-order walk below `root`, in source order.
    fn visit(&self, root: SyntaxNode<'c>, f: &mut impl FnMut(SyntaxNode<'c>)) {
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            f(node);
            stack.extend(node.children().into_iter().rev());
        }
    }
}
