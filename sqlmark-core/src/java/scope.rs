//! Name binding: which declaration a simple name refers to at a given point.
//!
//! Lookup walks outward from the use site, the way Java scoping does:
//! block statements declared earlier, `for`/catch/resource/lambda/method
//! parameters, then the fields of each enclosing class body (inherited
//! fields included, through corpus supertypes).

use std::collections::HashSet;

use super::host::{JavaHost, SyntaxNode};
use super::source::is_class_kind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingKind {
    Local,
    Parameter,
    Field,
}

/// A declaration a name resolves to.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding<'c> {
    /// `variable_declarator` for locals and fields, the name node otherwise.
    pub declarator: SyntaxNode<'c>,
    pub kind: BindingKind,
    pub type_node: Option<SyntaxNode<'c>>,
    pub value: Option<SyntaxNode<'c>>,
    pub is_final: bool,
}

impl<'c> JavaHost<'c> {
    /// Is this identifier used as an expression name (not a declaration,
    /// member name, method name, label or package segment)?
    pub(crate) fn is_expression_name(&self, ident: SyntaxNode<'c>) -> bool {
        let Some(parent) = ident.parent_node() else {
            return false;
        };
        if ident.is_field_of(&parent, "name")
            || ident.is_field_of(&parent, "field")
            || ident.is_field_of(&parent, "key")
        {
            return false;
        }
        match parent.kind() {
            "scoped_identifier"
            | "package_declaration"
            | "import_declaration"
            | "labeled_statement"
            | "break_statement"
            | "continue_statement"
            | "inferred_parameters"
            | "module_declaration" => false,
            "lambda_expression" => !ident.is_field_of(&parent, "parameters"),
            "method_reference" => parent.children().first() == Some(&ident),
            _ => true,
        }
    }

    /// The declaration `name` refers to when used at `at`.
    pub(crate) fn lookup(&self, at: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        let mut child = at;
        let mut current = at.parent_node();
        while let Some(scope) = current {
            if let Some(found) = self.binding_in_scope(scope, child, at, name) {
                return Some(found);
            }
            child = scope;
            current = scope.parent_node();
        }
        None
    }

    fn binding_in_scope(
        &self,
        scope: SyntaxNode<'c>,
        child: SyntaxNode<'c>,
        at: SyntaxNode<'c>,
        name: &str,
    ) -> Option<Binding<'c>> {
        match scope.kind() {
            "block" | "constructor_body" | "switch_block_statement_group" => scope
                .children()
                .into_iter()
                .take_while(|stmt| stmt.node.start_byte() <= child.node.start_byte())
                .filter(|stmt| stmt.kind() == "local_variable_declaration")
                .find_map(|decl| self.declared_in(decl, name, BindingKind::Local))
                .filter(|b| b.declarator.node.start_byte() < at.node.start_byte()),
            "for_statement" => scope
                .field("init")
                .filter(|init| init.kind() == "local_variable_declaration")
                .and_then(|init| self.declared_in(init, name, BindingKind::Local)),
            "enhanced_for_statement" => self
                .named_binding(scope, scope, name, BindingKind::Local)
                .map(|b| Binding { value: None, ..b }),
            "catch_clause" => scope
                .children()
                .into_iter()
                .find(|c| c.kind() == "catch_formal_parameter")
                .and_then(|param| self.named_binding(param, param, name, BindingKind::Local)),
            "try_with_resources_statement" => {
                let resources = scope.field("resources")?;
                resources
                    .children()
                    .into_iter()
                    .filter(|r| r.kind() == "resource")
                    .filter(|r| r.node.start_byte() < at.node.start_byte())
                    .find_map(|r| self.named_binding(r, r, name, BindingKind::Local))
            }
            "lambda_expression" => self.lambda_parameter(scope, name),
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                self.formal_parameter(scope.field("parameters")?, name)
            }
            "class_body" | "interface_body" | "enum_body_declarations" | "annotation_type_body" => {
                self.field_in_body(scope, name)
                    .or_else(|| self.inherited_field_of_body(scope, name))
            }
            "record_declaration" => scope
                .field("parameters")
                .and_then(|params| self.formal_parameter(params, name))
                .map(|b| Binding {
                    kind: BindingKind::Field,
                    is_final: true,
                    ..b
                }),
            _ => None,
        }
    }

    /// Binding for a node whose `name`/`type` fields are direct children
    /// (enhanced for, catch parameter, resource, formal parameter).
    fn named_binding(
        &self,
        holder: SyntaxNode<'c>,
        modifiers_of: SyntaxNode<'c>,
        name: &str,
        kind: BindingKind,
    ) -> Option<Binding<'c>> {
        let declared = holder.field("name")?;
        if self.text(declared) != name {
            return None;
        }
        let type_node = holder.field("type").or_else(|| {
            holder
                .children()
                .into_iter()
                .find(|c| c.kind() == "catch_type")
                .and_then(|t| t.children().into_iter().next())
        });
        Some(Binding {
            declarator: declared,
            kind,
            type_node,
            value: holder.field("value"),
            is_final: self.has_final_modifier(modifiers_of),
        })
    }

    fn formal_parameter(&self, params: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        params.children().into_iter().find_map(|param| match param.kind() {
            "formal_parameter" => self.named_binding(param, param, name, BindingKind::Parameter),
            "spread_parameter" => param
                .children()
                .into_iter()
                .find(|c| c.kind() == "variable_declarator")
                .and_then(|decl| self.named_binding(decl, param, name, BindingKind::Parameter))
                .map(|b| Binding {
                    type_node: param.children().into_iter().find(|c| c.kind() != "modifiers"),
                    ..b
                }),
            _ => None,
        })
    }

    fn lambda_parameter(&self, lambda: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        let params = lambda.field("parameters")?;
        let untyped = |ident: SyntaxNode<'c>| {
            (self.text(ident) == name).then_some(Binding {
                declarator: ident,
                kind: BindingKind::Parameter,
                type_node: None,
                value: None,
                is_final: false,
            })
        };
        match params.kind() {
            "identifier" => untyped(params),
            "inferred_parameters" => params.children().into_iter().find_map(untyped),
            "formal_parameters" => self.formal_parameter(params, name),
            _ => None,
        }
    }

    /// The declarator named `name` in a local, field or constant declaration.
    pub(crate) fn declared_in(
        &self,
        declaration: SyntaxNode<'c>,
        name: &str,
        kind: BindingKind,
    ) -> Option<Binding<'c>> {
        let declarator = declaration
            .children()
            .into_iter()
            .filter(|c| c.kind() == "variable_declarator")
            .find(|d| self.field_text(*d, "name") == Some(name))?;
        Some(Binding {
            declarator,
            kind,
            type_node: declaration.field("type"),
            value: declarator.field("value"),
            is_final: declaration.kind() == "constant_declaration"
                || self.has_final_modifier(declaration),
        })
    }

    fn has_final_modifier(&self, declaration: SyntaxNode<'c>) -> bool {
        declaration
            .children()
            .into_iter()
            .filter(|c| c.kind() == "modifiers")
            .any(|modifiers| {
                let mut cursor = modifiers.node.walk();
                let found = modifiers
                    .node
                    .children(&mut cursor)
                    .any(|m| m.kind() == "final");
                found
            })
    }

    /// Members of a class, interface, enum or record body.
    pub(crate) fn body_members(&self, body: SyntaxNode<'c>) -> Vec<SyntaxNode<'c>> {
        if body.kind() == "enum_body" {
            body.children()
                .into_iter()
                .filter(|c| c.kind() == "enum_body_declarations")
                .flat_map(|decls| decls.children())
                .collect()
        } else {
            body.children()
        }
    }

    fn field_in_body(&self, body: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        body.children()
            .into_iter()
            .filter(|m| matches!(m.kind(), "field_declaration" | "constant_declaration"))
            .find_map(|m| self.declared_in(m, name, BindingKind::Field))
    }

    /// Field `name` declared directly in a type declaration.
    pub(crate) fn field_in_class(&self, class: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        let body = class.field("body")?;
        if body.kind() == "enum_body" {
            return body
                .children()
                .into_iter()
                .filter(|c| c.kind() == "enum_body_declarations")
                .find_map(|decls| self.field_in_body(decls, name));
        }
        self.field_in_body(body, name)
    }

    /// Field `name` of corpus type `fqn` or of one of its corpus supertypes.
    pub(crate) fn find_field(&self, fqn: &str, name: &str) -> Option<Binding<'c>> {
        let mut visited = HashSet::new();
        self.find_field_in_hierarchy(fqn, name, &mut visited)
    }

    fn find_field_in_hierarchy(
        &self,
        fqn: &str,
        name: &str,
        visited: &mut HashSet<String>,
    ) -> Option<Binding<'c>> {
        if !visited.insert(fqn.to_string()) {
            return None;
        }
        let class = self.class_node(fqn)?;
        if let Some(found) = self.field_in_class(class, name) {
            return Some(found);
        }
        self.supertypes(class)
            .into_iter()
            .find_map(|sup| self.find_field_in_hierarchy(&sup, name, visited))
    }

    fn inherited_field_of_body(&self, body: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        let owner = match body.kind() {
            "enum_body_declarations" => body.parent_node()?.parent_node()?,
            _ => body.parent_node()?,
        };
        let supertypes = if is_class_kind(owner.kind()) {
            self.supertypes(owner)
        } else if owner.kind() == "object_creation_expression" {
            owner
                .field("type")
                .and_then(|t| self.resolve_type_node(t))
                .into_iter()
                .collect()
        } else {
            Vec::new()
        };
        supertypes
            .into_iter()
            .find_map(|sup| self.find_field(&sup, name))
    }

    /// Innermost first.
    pub(crate) fn enclosing_classes(&self, at: SyntaxNode<'c>) -> Vec<SyntaxNode<'c>> {
        let mut classes = Vec::new();
        let mut current = Some(at);
        while let Some(node) = current {
            if is_class_kind(node.kind()) {
                classes.push(node);
            }
            current = node.parent_node();
        }
        classes
    }

    /// The field named by `Type.NAME`, `pkg.Type.NAME`, `this.NAME` or `super.NAME`.
    pub(crate) fn qualified_field(&self, access: SyntaxNode<'c>) -> Option<Binding<'c>> {
        let name = self.field_text(access, "field")?;
        let object = access.field("object")?;
        match object.kind() {
            "this" => {
                let class = self.enclosing_classes(access).into_iter().next()?;
                let fqn = self.class_fqn(class)?;
                self.find_field(&fqn, name)
            }
            "super" => {
                let class = self.enclosing_classes(access).into_iter().next()?;
                self.supertypes(class)
                    .into_iter()
                    .find_map(|sup| self.find_field(&sup, name))
            }
            "identifier" | "field_access" if self.is_dotted_name(object) => {
                if object.kind() == "identifier" && self.lookup(object, self.text(object)).is_some() {
                    // instance field of a variable
                    return None;
                }
                let owner = self.resolve_type(object, self.text(object))?;
                self.find_field(&owner, name)
            }
            _ => None,
        }
    }

    /// `a`, `a.b`, `a.b.c`: identifiers joined by field accesses.
    pub(crate) fn is_dotted_name(&self, node: SyntaxNode<'c>) -> bool {
        match node.kind() {
            "identifier" => true,
            "field_access" => {
                node.field("field").map(|f| f.kind()) == Some("identifier")
                    && node.field("object").is_some_and(|o| self.is_dotted_name(o))
            }
            _ => false,
        }
    }

    /// The binding of a name imported with `import static`.
    pub(crate) fn static_import_field(&self, at: SyntaxNode<'c>, name: &str) -> Option<Binding<'c>> {
        let file = self.source_file(at.file);
        file.imports
            .iter()
            .filter(|import| import.is_static)
            .find_map(|import| {
                if import.on_demand {
                    self.find_field(&import.path, name)
                } else if import.simple_name() == name {
                    self.find_field(import.qualifier(), name)
                } else {
                    None
                }
            })
    }
}
