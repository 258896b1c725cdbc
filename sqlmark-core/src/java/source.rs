//! One parsed Java file and the facts indexed from it at load time.

use std::path::PathBuf;
use tree_sitter::{Node, Parser, Tree};

use super::literal::decode_string_literal;
use crate::error::SqlmarkError;

/// Node kinds that declare a named type.
pub(crate) const CLASS_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

#[inline]
pub(crate) fn is_class_kind(kind: &str) -> bool {
    CLASS_KINDS.contains(&kind)
}

#[inline]
pub(crate) fn is_comment(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment")
}

/// `package` + `.` + `name`, or `name` in the default package.
pub(crate) fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

/// One `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported name without the trailing `.*`.
    pub path: String,
    pub is_static: bool,
    pub on_demand: bool,
}

impl Import {
    /// Parse the text of an `import_declaration`.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim().strip_prefix("import")?.trim();
        let body = body.strip_suffix(';').unwrap_or(body).trim();
        let (is_static, body) = match body.strip_prefix("static") {
            Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest),
            _ => (false, body),
        };
        let path: String = body.chars().filter(|c| !c.is_whitespace()).collect();
        let (path, on_demand) = match path.strip_suffix(".*") {
            Some(prefix) => (prefix.to_string(), true),
            None => (path, false),
        };
        if path.is_empty() {
            return None;
        }
        Some(Self {
            path,
            is_static,
            on_demand,
        })
    }

    /// Last segment of a single import (`Sql` for `com.acme.Sql`).
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Everything before the last segment.
    pub fn qualifier(&self) -> &str {
        self.path.rsplit_once('.').map(|(q, _)| q).unwrap_or("")
    }
}

/// A declared type: fully qualified name and the byte range of its declaration.
#[derive(Debug, Clone)]
pub(crate) struct ClassEntry {
    pub fqn: String,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// A string literal with its decoded value.
#[derive(Debug, Clone)]
pub(crate) struct LiteralEntry {
    pub start_byte: usize,
    pub end_byte: usize,
    pub value: String,
}

/// A parsed Java compilation unit.
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub package: String,
    pub imports: Vec<Import>,
    pub(crate) tree: Tree,
    pub(crate) classes: Vec<ClassEntry>,
    pub(crate) literals: Vec<LiteralEntry>,
}

impl SourceFile {
    /// Parse `source` and index it. `None` only if tree-sitter gives up.
    pub fn parse(parser: &mut Parser, path: PathBuf, source: String) -> Option<Self> {
        let tree = parser.parse(&source, None)?;
        let root = tree.root_node();
        let package = package_of(root, &source);

        let (imports, classes, literals) = index(root, &source, &package);

        Some(Self {
            path,
            source,
            package,
            imports,
            tree,
            classes,
            literals,
        })
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn has_syntax_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Location of the first error or missing node, as a parse error.
    pub fn first_syntax_error(&self) -> Option<SqlmarkError> {
        let mut node = self.tree.root_node();
        if !node.has_error() {
            return None;
        }
        'descend: loop {
            if node.is_error() || node.is_missing() {
                break;
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.has_error() {
                    node = child;
                    continue 'descend;
                }
            }
            break;
        }
        let at = node.start_position();
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "unexpected syntax".to_string()
        };
        Some(SqlmarkError::parse_at(
            &self.path,
            message,
            at.row + 1,
            at.column + 1,
        ))
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, &self.source)
    }

    /// The node of one of `kinds` covering exactly `start..end`.
    pub(crate) fn node_at(&self, start: usize, end: usize, kinds: &[&str]) -> Option<Node<'_>> {
        let mut node = self.root().descendant_for_byte_range(start, end)?;
        loop {
            if node.start_byte() != start || node.end_byte() != end {
                return None;
            }
            if kinds.contains(&node.kind()) {
                return Some(node);
            }
            node = node.parent()?;
        }
    }

    /// Does this file import `name` statically, by name or on demand from `owner`?
    pub(crate) fn imports_static(&self, owner: &str, name: &str) -> bool {
        self.imports.iter().any(|import| {
            import.is_static
                && if import.on_demand {
                    import.path == owner
                } else {
                    import.simple_name() == name && import.qualifier() == owner
                }
        })
    }
}

pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

type Index = (Vec<Import>, Vec<ClassEntry>, Vec<LiteralEntry>);

/// Pre-order walk collecting imports, type declarations and string literals.
fn index(root: Node<'_>, source: &str, package: &str) -> Index {
    let mut imports = Vec::new();
    let mut classes = Vec::new();
    let mut literals = Vec::new();

    let mut stack = vec![root];
    let mut cursor = root.walk();
    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_declaration" => {
                imports.extend(Import::parse(node_text(node, source)));
                continue;
            }
            "string_literal" => {
                if let Some(value) = decode_string_literal(node_text(node, source)) {
                    literals.push(LiteralEntry {
                        start_byte: node.start_byte(),
                        end_byte: node.end_byte(),
                        value,
                    });
                }
                continue;
            }
            kind if is_class_kind(kind) => {
                if let Some(path) = class_name_path(node, source) {
                    classes.push(ClassEntry {
                        fqn: qualify(package, &path),
                        start_byte: node.start_byte(),
                        end_byte: node.end_byte(),
                    });
                }
            }
            _ => {}
        }
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    (imports, classes, literals)
}

fn package_of(root: Node<'_>, source: &str) -> String {
    let mut cursor = root.walk();
    let package = root
        .named_children(&mut cursor)
        .find(|child| child.kind() == "package_declaration");
    let Some(package) = package else {
        return String::new();
    };
    let mut cursor = package.walk();
    let name = package
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "identifier" | "scoped_identifier"));
    name.map(|n| node_text(n, source).split_whitespace().collect())
        .unwrap_or_default()
}

/// `Outer.Inner` for a type declaration, without the package.
pub(crate) fn class_name_path(node: Node<'_>, source: &str) -> Option<String> {
    let mut names = Vec::new();
    let mut current = Some(node);
    while let Some(n) = current {
        if is_class_kind(n.kind()) {
            names.push(node_text(n.child_by_field_name("name")?, source));
        }
        current = n.parent();
    }
    names.reverse();
    Some(names.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SourceFile {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        SourceFile::parse(&mut parser, "Test.java".into(), src.to_string()).unwrap()
    }

    #[test]
    fn test_import_parse() {
        let single = Import::parse("import com.acme.Sql;").unwrap();
        assert_eq!(single.path, "com.acme.Sql");
        assert!(!single.is_static && !single.on_demand);
        assert_eq!(single.simple_name(), "Sql");
        assert_eq!(single.qualifier(), "com.acme");

        let star = Import::parse("import static com.acme.Sql.*;").unwrap();
        assert_eq!(star.path, "com.acme.Sql");
        assert!(star.is_static && star.on_demand);

        let staticky = Import::parse("import staticutil.Foo;").unwrap();
        assert!(!staticky.is_static);
        assert_eq!(staticky.path, "staticutil.Foo");
    }

    #[test]
    fn test_index_package_imports_classes() {
        let file = parse(
            r#"
package com.acme.dao;
import com.acme.Sql;
import static com.acme.Keys.*;
public class Dao {
    static class Inner {}
    interface Api {}
}
enum Mode { A }
"#,
        );
        assert_eq!(file.package, "com.acme.dao");
        assert_eq!(file.imports.len(), 2);
        let fqns: Vec<&str> = file.classes.iter().map(|c| c.fqn.as_str()).collect();
        assert_eq!(
            fqns,
            vec![
                "com.acme.dao.Dao",
                "com.acme.dao.Dao.Inner",
                "com.acme.dao.Dao.Api",
                "com.acme.dao.Mode"
            ]
        );
        assert!(file.imports_static("com.acme.Keys", "ID"));
        assert!(!file.imports_static("com.acme.Sql", "ID"));
    }

    #[test]
    fn test_literal_index_in_source_order() {
        let file = parse(r#"class A { String a = "x\ty"; String b = "z"; }"#);
        let values: Vec<&str> = file.literals.iter().map(|l| l.value.as_str()).collect();
        assert_eq!(values, vec!["x\ty", "z"]);

        let first = &file.literals[0];
        let node = file
            .node_at(first.start_byte, first.end_byte, &["string_literal"])
            .unwrap();
        assert_eq!(file.text(node), r#""x\ty""#);
    }

    #[test]
    fn test_first_syntax_error() {
        assert!(parse("class A {}").first_syntax_error().is_none());

        let file = parse("class A {\n  void f() { String s = \"x\" }\n}");
        match file.first_syntax_error() {
            Some(SqlmarkError::Parse { line, path, .. }) => {
                assert_eq!(line, Some(2));
                assert_eq!(path, PathBuf::from("Test.java"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_package() {
        let file = parse("class A {}");
        assert_eq!(file.package, "");
        assert_eq!(file.classes[0].fqn, "A");
    }
}
