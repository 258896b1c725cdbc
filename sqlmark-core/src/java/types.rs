//! Type names: resolving simple and qualified names to fully qualified
//! ones, typing call receivers, and finding the type that declares a
//! called method.

use std::collections::HashSet;

use super::host::{JavaHost, SyntaxNode};
use super::scope::Binding;
use super::source::{class_name_path, qualify, CLASS_KINDS};
use crate::error::TraceError;
use crate::syntax::CallTarget;

/// `java.lang` types visible without an import.
const JAVA_LANG: &[&str] = &[
    "Boolean",
    "Byte",
    "Character",
    "CharSequence",
    "Class",
    "Comparable",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "IllegalArgumentException",
    "IllegalStateException",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Record",
    "Runnable",
    "RuntimeException",
    "Short",
    "String",
    "StringBuffer",
    "StringBuilder",
    "System",
    "Thread",
    "Throwable",
    "Void",
];

impl<'c> JavaHost<'c> {
    /// Declaration node of corpus type `fqn`.
    pub(crate) fn class_node(&self, fqn: &str) -> Option<SyntaxNode<'c>> {
        let location = self.corpus.class_location(fqn)?;
        let file = self.source_file(location.file);
        let node = file.node_at(location.start_byte, location.end_byte, CLASS_KINDS)?;
        Some(SyntaxNode {
            file: location.file,
            node,
        })
    }

    pub(crate) fn class_fqn(&self, class: SyntaxNode<'c>) -> Option<String> {
        let file = self.source_file(class.file);
        let path = class_name_path(class.node, &file.source)?;
        Some(qualify(&file.package, &path))
    }

    /// Written name of a type node, generics and whitespace dropped.
    pub(crate) fn type_name(&self, ty: SyntaxNode<'c>) -> Option<String> {
        match ty.kind() {
            "type_identifier" | "scoped_type_identifier" => {
                Some(self.text(ty).split_whitespace().collect())
            }
            "generic_type" => ty
                .children()
                .into_iter()
                .next()
                .and_then(|inner| self.type_name(inner)),
            "annotated_type" => ty
                .children()
                .into_iter()
                .last()
                .and_then(|inner| self.type_name(inner)),
            _ => None,
        }
    }

    pub(crate) fn resolve_type_node(&self, ty: SyntaxNode<'c>) -> Option<String> {
        let name = self.type_name(ty)?;
        self.resolve_type(ty, &name)
    }

    /// Fully qualified name for `name` as written at `ctx`.
    pub(crate) fn resolve_type(&self, ctx: SyntaxNode<'c>, name: &str) -> Option<String> {
        let name: String = name
            .split('<')
            .next()
            .unwrap_or(name)
            .split_whitespace()
            .collect();
        if name.is_empty() {
            return None;
        }

        let Some((head, rest)) = name.split_once('.') else {
            return self.resolve_simple_type(ctx, &name);
        };
        if self.corpus.declares_class(&name) || head.starts_with(|c: char| c.is_lowercase()) {
            return Some(name);
        }
        let outer = self.resolve_simple_type(ctx, head)?;
        Some(format!("{outer}.{rest}"))
    }

    fn resolve_simple_type(&self, ctx: SyntaxNode<'c>, name: &str) -> Option<String> {
        let file = self.source_file(ctx.file);

        for class in self.enclosing_classes(ctx) {
            let Some(fqn) = self.class_fqn(class) else {
                continue;
            };
            if self.field_text(class, "name") == Some(name) {
                return Some(fqn);
            }
            let member = format!("{fqn}.{name}");
            if self.corpus.declares_class(&member) {
                return Some(member);
            }
        }

        if let Some(import) = file
            .imports
            .iter()
            .find(|i| !i.is_static && !i.on_demand && i.simple_name() == name)
        {
            return Some(import.path.clone());
        }

        let same_package = qualify(&file.package, name);
        if self.corpus.declares_class(&same_package) {
            return Some(same_package);
        }

        let on_demand: Vec<&str> = file
            .imports
            .iter()
            .filter(|i| !i.is_static && i.on_demand)
            .map(|i| i.path.as_str())
            .collect();
        if let Some(found) = on_demand
            .iter()
            .map(|pkg| format!("{pkg}.{name}"))
            .find(|candidate| self.corpus.declares_class(candidate))
        {
            return Some(found);
        }

        if JAVA_LANG.contains(&name) {
            return Some(format!("java.lang.{name}"));
        }

        // Nothing else can supply the name: assume the current package.
        let ambiguous = on_demand.iter().any(|pkg| *pkg != "java.lang");
        (!ambiguous).then_some(same_package)
    }

    /// Superclass first, then interfaces; names resolved where declared.
    pub(crate) fn supertypes(&self, class: SyntaxNode<'c>) -> Vec<String> {
        let mut superclass = Vec::new();
        let mut interfaces = Vec::new();
        for child in class.children() {
            match child.kind() {
                "superclass" => superclass.extend(
                    child
                        .children()
                        .into_iter()
                        .next()
                        .and_then(|ty| self.resolve_type_node(ty)),
                ),
                "super_interfaces" | "extends_interfaces" => {
                    for list in child.children() {
                        interfaces.extend(
                            list.children()
                                .into_iter()
                                .filter_map(|ty| self.resolve_type_node(ty)),
                        );
                    }
                }
                _ => {}
            }
        }
        superclass.extend(interfaces);
        superclass
    }

    fn superclass(&self, class: SyntaxNode<'c>) -> Option<String> {
        let node = class.children().into_iter().find(|c| c.kind() == "superclass")?;
        let ty = node.children().into_iter().next()?;
        self.resolve_type_node(ty)
    }

    pub(crate) fn declares_method(&self, class: SyntaxNode<'c>, method: &str) -> bool {
        let Some(body) = class.field("body") else {
            return false;
        };
        self.body_members(body)
            .into_iter()
            .filter(|m| m.kind() == "method_declaration")
            .any(|m| self.field_text(m, "name") == Some(method))
    }

    /// The type declaring `method` as seen from `fqn`.
    ///
    /// Walks the corpus superclass chain (then corpus interfaces). A type
    /// outside the corpus is taken to declare the method itself.
    pub(crate) fn declaring_type(&self, fqn: &str, method: &str) -> String {
        let mut visited = HashSet::new();
        self.find_declaring(fqn, method, &mut visited)
            .unwrap_or_else(|| fqn.to_string())
    }

    fn find_declaring(&self, fqn: &str, method: &str, visited: &mut HashSet<String>) -> Option<String> {
        if !visited.insert(fqn.to_string()) {
            return None;
        }
        let Some(class) = self.class_node(fqn) else {
            return Some(fqn.to_string());
        };
        if self.declares_method(class, method) {
            return Some(fqn.to_string());
        }
        if let Some(sup) = self.superclass(class) {
            if let Some(found) = self.find_declaring(&sup, method, visited) {
                return Some(found);
            }
        }
        self.supertypes(class)
            .into_iter()
            .filter(|sup| self.corpus.declares_class(sup))
            .find_map(|sup| self.find_declaring(&sup, method, visited))
    }

    /// Declaring type and name of the method a `method_invocation` calls.
    pub(crate) fn call_target(&self, call: SyntaxNode<'c>) -> Result<CallTarget, TraceError> {
        if call.kind() != "method_invocation" {
            return Err(TraceError::stale(format!("{} is not a method call", call.kind())));
        }
        let method = self
            .field_text(call, "name")
            .ok_or_else(|| TraceError::stale("call without a method name"))?;

        let declaring_type = match call.field("object") {
            Some(receiver) => {
                let receiver_type = self.expression_type(receiver)?;
                self.declaring_type(&receiver_type, method)
            }
            None => self.unqualified_call_owner(call, method)?,
        };

        Ok(CallTarget {
            declaring_type,
            method: method.to_string(),
        })
    }

    /// Static type of a receiver expression.
    pub(crate) fn expression_type(&self, expr: SyntaxNode<'c>) -> Result<String, TraceError> {
        let unresolved = || TraceError::stale(format!("receiver '{}'", self.text(expr)));
        match expr.kind() {
            "identifier" => {
                let name = self.text(expr);
                match self.lookup(expr, name) {
                    Some(binding) => self.binding_type(binding).ok_or_else(unresolved),
                    None => self.resolve_type(expr, name).ok_or_else(unresolved),
                }
            }
            "field_access" => {
                if let Some(binding) = self.qualified_field(expr) {
                    return self.binding_type(binding).ok_or_else(unresolved);
                }
                if self.is_dotted_name(expr) && !self.starts_with_variable(expr) {
                    return self.resolve_type(expr, self.text(expr)).ok_or_else(unresolved);
                }
                Err(unresolved())
            }
            "this" => self
                .enclosing_classes(expr)
                .into_iter()
                .next()
                .and_then(|class| self.class_fqn(class))
                .ok_or_else(unresolved),
            "super" => {
                let class = self.enclosing_classes(expr).into_iter().next().ok_or_else(unresolved)?;
                Ok(self
                    .superclass(class)
                    .unwrap_or_else(|| "java.lang.Object".to_string()))
            }
            "parenthesized_expression" => match expr.children().first() {
                Some(inner) => self.expression_type(*inner),
                None => Err(unresolved()),
            },
            "cast_expression" | "object_creation_expression" => expr
                .field("type")
                .and_then(|ty| self.resolve_type_node(ty))
                .ok_or_else(unresolved),
            "string_literal" => Ok("java.lang.String".to_string()),
            _ => Err(unresolved()),
        }
    }

    /// Declared type of a binding; `var` is typed from a `new` initializer.
    fn binding_type(&self, binding: Binding<'c>) -> Option<String> {
        let ty = binding.type_node?;
        if self.text(ty) == "var" {
            let value = binding.value?;
            if value.kind() != "object_creation_expression" {
                return None;
            }
            return self.resolve_type_node(value.field("type")?);
        }
        self.resolve_type_node(ty)
    }

    fn starts_with_variable(&self, dotted: SyntaxNode<'c>) -> bool {
        let mut head = dotted;
        while let Some(object) = head.field("object") {
            head = object;
        }
        head.kind() == "identifier" && self.lookup(head, self.text(head)).is_some()
    }

    /// Owner of `method(...)` called without a receiver: the enclosing
    /// classes (innermost first), then static imports. A supertype outside
    /// the corpus is only assumed to declare the method when no static
    /// import names it.
    fn unqualified_call_owner(&self, call: SyntaxNode<'c>, method: &str) -> Result<String, TraceError> {
        let mut external_super = None;
        for class in self.enclosing_classes(call) {
            let Some(fqn) = self.class_fqn(class) else {
                continue;
            };
            if self.declares_method(class, method) {
                return Ok(fqn);
            }
            let mut visited = HashSet::from([fqn]);
            if let Some(sup) = self.superclass(class) {
                match self.find_declaring(&sup, method, &mut visited) {
                    Some(found) if self.corpus.declares_class(&found) => return Ok(found),
                    Some(found) => {
                        external_super.get_or_insert(found);
                    }
                    None => {}
                }
            }
        }

        let file = self.source_file(call.file);
        let statics: Vec<_> = file.imports.iter().filter(|i| i.is_static).collect();
        if let Some(single) = statics
            .iter()
            .find(|i| !i.on_demand && i.simple_name() == method)
        {
            let owner = single.qualifier().to_string();
            return Ok(self.declaring_type(&owner, method));
        }

        let on_demand: Vec<&str> = statics
            .iter()
            .filter(|i| i.on_demand)
            .map(|i| i.path.as_str())
            .collect();
        if let Some(owner) = on_demand.iter().find(|owner| {
            self.class_node(owner)
                .is_some_and(|class| self.declares_method(class, method))
        }) {
            return Ok(owner.to_string());
        }
        if let Some(sup) = external_super {
            return Ok(sup);
        }
        match on_demand.as_slice() {
            [only] if !self.corpus.declares_class(only) => Ok(only.to_string()),
            _ => Err(TraceError::stale(format!("unqualified call '{method}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::java::JavaCorpus;
    use crate::syntax::{AstAccessor, CorpusIndex, ReferenceSearch};

    /// Declaring type of the call whose first argument literal contains `marker`.
    fn target_of(sources: &[(&str, &str)], marker: &str) -> Option<String> {
        let corpus = JavaCorpus::from_sources(
            sources
                .iter()
                .map(|(p, s)| (p.into(), s.to_string()))
                .collect(),
        );
        let host = corpus.host();
        let literal = host.find_literal_occurrences(marker)[0];
        let call = host.parent(host.parent(literal)?)?;
        host.resolve_call_target(call).ok().map(|t| t.declaring_type)
    }

    #[test]
    fn test_static_receiver_via_import() {
        let src = r#"
package app;
import com.acme.db.DBUtils;
class Dao { void f() { DBUtils.selectList("m"); } }"#;
        assert_eq!(target_of(&[("Dao.java", src)], "m").as_deref(), Some("com.acme.db.DBUtils"));
    }

    #[test]
    fn test_static_receiver_same_package_fallback() {
        let src = "package app; class Dao { void f() { DBUtils.selectList(\"m\"); } }";
        assert_eq!(target_of(&[("Dao.java", src)], "m").as_deref(), Some("app.DBUtils"));
    }

    #[test]
    fn test_on_demand_import_blocks_fallback() {
        let src = "package app; import org.other.*; class Dao { void f() { DBUtils.selectList(\"m\"); } }";
        assert_eq!(target_of(&[("Dao.java", src)], "m"), None);
    }

    #[test]
    fn test_on_demand_import_matched_against_corpus() {
        let api = "package com.acme.db; public class DBUtils { public static void selectList(String id) {} }";
        let dao = "package app; import com.acme.db.*; class Dao { void f() { DBUtils.selectList(\"m\"); } }";
        assert_eq!(
            target_of(&[("DBUtils.java", api), ("Dao.java", dao)], "m").as_deref(),
            Some("com.acme.db.DBUtils")
        );
    }

    #[test]
    fn test_fully_qualified_receiver() {
        let src = "class Dao { void f() { com.acme.DBUtils.selectList(\"m\"); } }";
        assert_eq!(target_of(&[("Dao.java", src)], "m").as_deref(), Some("com.acme.DBUtils"));
    }

    #[test]
    fn test_instance_receivers() {
        let src = r#"
package app;
import com.acme.db.SqlSession;
class Dao {
    private SqlSession session;
    void f(SqlSession param) {
        SqlSession local = open();
        local.selectOne("local");
        param.selectOne("param");
        session.selectOne("field");
        this.session.selectOne("this");
        var inferred = new SqlSession();
        inferred.selectOne("var");
    }
}"#;
        for marker in ["local", "param", "field", "this", "var"] {
            assert_eq!(
                target_of(&[("Dao.java", src)], marker).as_deref(),
                Some("com.acme.db.SqlSession"),
                "{marker}"
            );
        }
    }

    #[test]
    fn test_inherited_method_declaring_type() {
        let base = "package p; public class BaseUtils { public static void selectList(String id) {} }";
        let api = "package p; public class DBUtils extends BaseUtils { public static void update(String id) {} }";
        let dao = "package p; class Dao { void f() { DBUtils.selectList(\"m\"); DBUtils.update(\"u\"); } }";
        let files = [("BaseUtils.java", base), ("DBUtils.java", api), ("Dao.java", dao)];
        assert_eq!(target_of(&files, "m").as_deref(), Some("p.BaseUtils"));
        assert_eq!(target_of(&files, "u").as_deref(), Some("p.DBUtils"));
    }

    #[test]
    fn test_unqualified_calls() {
        let api = "package com.acme; public class DBUtils { public static void selectList(String id) {} }";
        let dao = r#"
package app;
import static com.acme.DBUtils.selectList;
class Dao {
    void f() { selectList("imported"); helper("own"); }
    void helper(String s) {}
}"#;
        let files = [("DBUtils.java", api), ("Dao.java", dao)];
        assert_eq!(target_of(&files, "imported").as_deref(), Some("com.acme.DBUtils"));
        assert_eq!(target_of(&files, "own").as_deref(), Some("app.Dao"));
    }

    #[test]
    fn test_static_import_beats_external_superclass() {
        let dao = r#"
package app;
import org.springframework.dao.support.DaoSupport;
import static com.acme.DBUtils.selectList;
class Dao extends DaoSupport {
    void f() { selectList("imported"); checkDaoConfig("inherited"); }
}"#;
        let files = [("Dao.java", dao)];
        assert_eq!(target_of(&files, "imported").as_deref(), Some("com.acme.DBUtils"));
        assert_eq!(
            target_of(&files, "inherited").as_deref(),
            Some("org.springframework.dao.support.DaoSupport")
        );
    }

    #[test]
    fn test_unqualified_call_through_static_on_demand() {
        let dao = "package app; import static com.acme.DBUtils.*; class Dao { void f() { selectList(\"m\"); } }";
        assert_eq!(target_of(&[("Dao.java", dao)], "m").as_deref(), Some("com.acme.DBUtils"));
    }

    #[test]
    fn test_unknown_unqualified_call() {
        let dao = "class Dao { void f() { log(\"m\"); } }";
        assert_eq!(target_of(&[("Dao.java", dao)], "m"), None);
    }

    #[test]
    fn test_method_chain_receiver_unresolved() {
        let dao = "class Dao { void f() { factory().open().selectList(\"m\"); } }";
        assert_eq!(target_of(&[("Dao.java", dao)], "m"), None);
    }
}
