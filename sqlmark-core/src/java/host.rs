//! The `Copy` view over a [`JavaCorpus`] that the resolution core consumes.

use std::fmt;
use std::hash::{Hash, Hasher};
use tree_sitter::Node;

use super::literal::decode_string_literal;
use super::source::{is_comment, SourceFile};
use super::{FileId, JavaCorpus};
use crate::error::TraceError;
use crate::syntax::{
    AstAccessor, CallExpr, CallSite, CallTarget, CorpusIndex, ReferenceSearch, Syntax,
};

/// Longest snippet kept for a call site.
const MAX_SNIPPET: usize = 160;

/// A tree-sitter node tagged with the file it belongs to.
///
/// Equality and hashing use the file and tree-sitter's node id, so two
/// handles are equal exactly when they name the same AST node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'c> {
    pub(crate) file: FileId,
    pub(crate) node: Node<'c>,
}

impl<'c> SyntaxNode<'c> {
    pub fn file_id(&self) -> FileId {
        self.file
    }

    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    pub(crate) fn with(&self, node: Node<'c>) -> Self {
        Self {
            file: self.file,
            node,
        }
    }

    pub(crate) fn field(&self, name: &str) -> Option<Self> {
        self.node.child_by_field_name(name).map(|n| self.with(n))
    }

    pub(crate) fn parent_node(&self) -> Option<Self> {
        self.node.parent().map(|n| self.with(n))
    }

    /// Named children, comments excluded.
    pub(crate) fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .filter(|n| !is_comment(n.kind()))
            .map(|n| self.with(n))
            .collect()
    }

    pub(crate) fn is_field_of(&self, parent: &Self, field: &str) -> bool {
        parent.node.child_by_field_name(field).map(|n| n.id()) == Some(self.node.id())
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.node.id() == other.node.id()
    }
}

impl Eq for SyntaxNode<'_> {}

impl Hash for SyntaxNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file.hash(state);
        self.node.id().hash(state);
    }
}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.node.start_position();
        write!(
            f,
            "{}@{}:{}:{}",
            self.node.kind(),
            self.file,
            pos.row + 1,
            pos.column + 1
        )
    }
}

/// Read-only view over a corpus.
#[derive(Clone, Copy)]
pub struct JavaHost<'c> {
    pub(crate) corpus: &'c JavaCorpus,
}

impl<'c> JavaHost<'c> {
    pub fn new(corpus: &'c JavaCorpus) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &'c JavaCorpus {
        self.corpus
    }

    pub(crate) fn source_file(&self, id: FileId) -> &'c SourceFile {
        let corpus: &'c JavaCorpus = self.corpus;
        &corpus.files[id]
    }

    /// Source text of `node`.
    pub fn text(&self, node: SyntaxNode<'c>) -> &'c str {
        let file = self.source_file(node.file);
        file.source
            .get(node.node.start_byte()..node.node.end_byte())
            .unwrap_or("")
    }

    /// Text of the child in `field`, if any.
    pub(crate) fn field_text(&self, node: SyntaxNode<'c>, field: &str) -> Option<&'c str> {
        node.field(field).map(|n| self.text(n))
    }

    fn classify_call(&self, node: SyntaxNode<'c>) -> Syntax<SyntaxNode<'c>> {
        let Some(method) = self.field_text(node, "name") else {
            return Syntax::Other;
        };
        let arguments = node
            .field("arguments")
            .map(|list| list.children())
            .unwrap_or_default();
        Syntax::Call(CallExpr {
            receiver: node.field("object"),
            method: method.to_string(),
            arguments,
        })
    }
}

impl fmt::Debug for JavaHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JavaHost")
            .field("files", &self.corpus.len())
            .finish()
    }
}

impl<'c> AstAccessor for JavaHost<'c> {
    type Node = SyntaxNode<'c>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node> {
        node.parent_node()
    }

    fn syntax(&self, node: Self::Node) -> Syntax<Self::Node> {
        match node.kind() {
            "string_literal" => decode_string_literal(self.text(node))
                .map(Syntax::Literal)
                .unwrap_or(Syntax::Other),
            "binary_expression" => {
                let is_plus = node.field("operator").map(|op| op.kind()) == Some("+");
                match (is_plus, node.field("left"), node.field("right")) {
                    (true, Some(left), Some(right)) => Syntax::Binary { left, right },
                    _ => Syntax::Other,
                }
            }
            "parenthesized_expression" => match node.children().first() {
                Some(inner) => Syntax::Parenthesized(*inner),
                None => Syntax::Other,
            },
            "method_invocation" => self.classify_call(node),
            "argument_list" => Syntax::ArgumentList(node.children()),
            "variable_declarator" => match self.field_text(node, "name") {
                Some(name) => Syntax::Declarator {
                    name: name.to_string(),
                    value: node.field("value"),
                },
                None => Syntax::Other,
            },
            "local_variable_declaration" => Syntax::LocalVarDecl,
            "field_declaration" | "constant_declaration" => Syntax::FieldDecl,
            "identifier" if self.is_expression_name(node) => {
                Syntax::Reference(self.text(node).to_string())
            }
            "field_access" => match self.field_text(node, "field") {
                Some(field) => Syntax::Reference(field.to_string()),
                None => Syntax::Other,
            },
            _ => Syntax::Other,
        }
    }

    fn evaluate_constant(&self, node: Self::Node) -> Option<String> {
        self.constant_string(node)
    }

    fn call_site(&self, node: Self::Node) -> Option<CallSite> {
        if node.kind() != "method_invocation" {
            return None;
        }
        let file = self.source_file(node.file);
        let start = node.node.start_position();
        let first_line = self.text(node).lines().next().unwrap_or("").trim_end();
        let snippet = match first_line.char_indices().nth(MAX_SNIPPET) {
            Some((cut, _)) => format!("{}...", &first_line[..cut]),
            None => first_line.to_string(),
        };

        Some(CallSite {
            file: file.path.clone(),
            line: start.row + 1,
            column: start.column + 1,
            start_byte: node.node.start_byte(),
            end_byte: node.node.end_byte(),
            method: self.field_text(node, "name").unwrap_or("").to_string(),
            snippet,
        })
    }
}

impl CorpusIndex for JavaHost<'_> {
    fn find_literal_occurrences(&self, needle: &str) -> Vec<Self::Node> {
        let mut found = Vec::new();
        for (id, file) in self.corpus.files().iter().enumerate() {
            for literal in file.literals.iter().filter(|l| l.value.contains(needle)) {
                if let Some(node) =
                    file.node_at(literal.start_byte, literal.end_byte, &["string_literal"])
                {
                    found.push(SyntaxNode { file: id, node });
                }
            }
        }
        found
    }
}

impl ReferenceSearch for JavaHost<'_> {
    fn find_references(&self, declarator: Self::Node) -> Result<Vec<Self::Node>, TraceError> {
        self.references_of(declarator)
    }

    fn resolve_call_target(&self, call: Self::Node) -> Result<CallTarget, TraceError> {
        self.call_target(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ancestors;

    fn corpus(src: &str) -> JavaCorpus {
        JavaCorpus::from_sources(vec![("src/A.java".into(), src.to_string())])
    }

    #[test]
    fn test_classification() {
        let corpus = corpus(
            r#"class A { void f() { String s = ("ns." + "sqlId"); DBUtils.selectList(s, p); } }"#,
        );
        let host = corpus.host();
        let literal = host.find_literal_occurrences("sqlId")[0];
        assert_eq!(host.syntax(literal), Syntax::Literal("sqlId".to_string()));

        let kinds: Vec<&str> = ancestors(&host, literal)
            .take(4)
            .map(|n| match host.syntax(n) {
                Syntax::Binary { .. } => "binary",
                Syntax::Parenthesized(_) => "paren",
                Syntax::Declarator { .. } => "declarator",
                Syntax::LocalVarDecl => "local",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["binary", "paren", "declarator", "local"]);
    }

    fn first_of_kind<'c>(corpus: &'c JavaCorpus, kind: &str) -> SyntaxNode<'c> {
        let mut stack = vec![corpus.files()[0].root()];
        while let Some(node) = stack.pop() {
            if node.kind() == kind {
                return SyntaxNode { file: 0, node };
            }
            let mut cursor = node.walk();
            stack.extend(node.named_children(&mut cursor).collect::<Vec<_>>());
        }
        panic!("no {kind} node");
    }

    #[test]
    fn test_reference_classification() {
        let corpus = corpus(
            "class A { static final String ID = \"x\"; void f() { use(ID, this.ID, A.ID); } }",
        );
        let host = corpus.host();
        let list = first_of_kind(&corpus, "argument_list");
        let Syntax::ArgumentList(args) = host.syntax(list) else {
            panic!("expected argument list");
        };
        let names: Vec<_> = args.iter().map(|a| host.syntax(*a)).collect();
        assert_eq!(names, vec![Syntax::Reference("ID".to_string()); 3]);

        let declarator = first_of_kind(&corpus, "variable_declarator");
        let name = declarator.field("name").unwrap();
        assert_eq!(host.syntax(name), Syntax::Other);
    }

    #[test]
    fn test_minus_is_not_binary() {
        let corpus = corpus("class A { int x = 1 - 2; }");
        let host = corpus.host();
        let minus = first_of_kind(&corpus, "binary_expression");
        assert_eq!(host.syntax(minus), Syntax::Other);
    }

    #[test]
    fn test_call_classification_and_site() {
        let corpus = corpus("class A {\n  void f() {\n    DBUtils.selectList(\"ns.sqlId\", /* c */ p);\n  }\n}");
        let host = corpus.host();
        let literal = host.find_literal_occurrences("sqlId")[0];
        let list = host.parent(literal).unwrap();
        let Syntax::ArgumentList(args) = host.syntax(list) else {
            panic!("expected argument list");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], literal);

        let call = host.parent(list).unwrap();
        let Syntax::Call(expr) = host.syntax(call) else {
            panic!("expected call");
        };
        assert_eq!(expr.method, "selectList");
        assert_eq!(host.text(expr.receiver.unwrap()), "DBUtils");

        let site = host.call_site(call).unwrap();
        assert_eq!((site.line, site.column), (3, 5));
        assert_eq!(site.method, "selectList");
        assert_eq!(site.snippet, "DBUtils.selectList(\"ns.sqlId\", /* c */ p)");
        assert_eq!(site.to_string(), "src/A.java:3:5  DBUtils.selectList(\"ns.sqlId\", /* c */ p)");
    }

    #[test]
    fn test_call_site_only_for_calls() {
        let corpus = corpus(r#"class A { String s = "sqlId"; }"#);
        let host = corpus.host();
        let literal = host.find_literal_occurrences("sqlId")[0];
        assert!(host.call_site(literal).is_none());
    }

    #[test]
    fn test_occurrences_use_decoded_values() {
        let corpus = corpus(
            "class A { String a = \"ns.sql\\u0049d\"; String b = \"\"\"\n    ns.sqlId\n    \"\"\"; String c = \"other\"; }",
        );
        let host = corpus.host();
        let found: Vec<String> = host
            .find_literal_occurrences("sqlId")
            .into_iter()
            .filter_map(|n| match host.syntax(n) {
                Syntax::Literal(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(found, vec!["ns.sqlId".to_string(), "ns.sqlId\n".to_string()]);
    }

    #[test]
    fn test_node_identity() {
        let corpus = corpus(r#"class A { String a = "sqlId"; String b = "sqlId"; }"#);
        let host = corpus.host();
        let first = host.find_literal_occurrences("sqlId");
        let second = host.find_literal_occurrences("sqlId");
        assert_eq!(first, second);
        assert_ne!(first[0], first[1]);
    }
}
