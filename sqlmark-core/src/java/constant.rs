//! Compile-time constant folding for the expressions statement ids are
//! built from.

use super::host::{JavaHost, SyntaxNode};
use super::literal::{decode_char_literal, decode_string_literal};
use super::scope::Binding;

/// Deepest chain of constant variables followed.
const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Constant {
    Str(String),
    Int(i32),
    Long(i64),
    Char(char),
    Bool(bool),
}

impl Constant {
    fn into_text(self) -> String {
        match self {
            Self::Str(s) => s,
            Self::Int(i) => i.to_string(),
            Self::Long(l) => l.to_string(),
            Self::Char(c) => c.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Value after unary numeric promotion (`char` widens to `int`).
    fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Char(c) => Some(*c as i32),
            _ => None,
        }
    }

    fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(l) => Some(*l),
            other => other.as_int().map(i64::from),
        }
    }
}

/// Java `+ - *` on constants: string concatenation when either side is a
/// string, otherwise two's-complement arithmetic in `int` or `long`.
fn fold(operator: &str, left: Constant, right: Constant) -> Option<Constant> {
    if operator == "+" && (matches!(left, Constant::Str(_)) || matches!(right, Constant::Str(_))) {
        let mut text = left.into_text();
        text.push_str(&right.into_text());
        return Some(Constant::Str(text));
    }
    if matches!(left, Constant::Long(_)) || matches!(right, Constant::Long(_)) {
        let (l, r) = (left.as_long()?, right.as_long()?);
        let value = match operator {
            "+" => l.wrapping_add(r),
            "-" => l.wrapping_sub(r),
            "*" => l.wrapping_mul(r),
            _ => return None,
        };
        return Some(Constant::Long(value));
    }
    let (l, r) = (left.as_int()?, right.as_int()?);
    let value = match operator {
        "+" => l.wrapping_add(r),
        "-" => l.wrapping_sub(r),
        "*" => l.wrapping_mul(r),
        _ => return None,
    };
    Some(Constant::Int(value))
}

fn negate(value: Constant) -> Option<Constant> {
    match value {
        Constant::Long(l) => Some(Constant::Long(l.wrapping_neg())),
        other => other.as_int().map(|i| Constant::Int(i.wrapping_neg())),
    }
}

/// Integer literal; an `L` suffix makes it a `long`. Non-decimal `int`
/// literals may use all 32 bits (`0xFFFFFFFF` is `-1`).
fn parse_int(raw: &str) -> Option<Constant> {
    let is_long = raw.ends_with(['l', 'L']);
    let digits: String = raw
        .trim_end_matches(['l', 'L'])
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let lower = digits.to_ascii_lowercase();
    let (magnitude, decimal) = if let Some(hex) = lower.strip_prefix("0x") {
        (u64::from_str_radix(hex, 16).ok()?, false)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (u64::from_str_radix(bin, 2).ok()?, false)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (u64::from_str_radix(&lower[1..], 8).ok()?, false)
    } else {
        (lower.parse::<u64>().ok()?, true)
    };

    match (is_long, decimal) {
        (true, true) => i64::try_from(magnitude).ok().map(Constant::Long),
        (true, false) => Some(Constant::Long(magnitude as i64)),
        (false, true) => i32::try_from(magnitude).ok().map(Constant::Int),
        (false, false) => u32::try_from(magnitude)
            .ok()
            .map(|bits| Constant::Int(bits as i32)),
    }
}

impl<'c> JavaHost<'c> {
    /// String value of a constant expression.
    pub(crate) fn constant_string(&self, node: SyntaxNode<'c>) -> Option<String> {
        match self.constant(node, &mut Vec::new())? {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }

    /// `visiting` holds the constant variables being expanded; revisiting
    /// one means the definition is cyclic.
    pub(crate) fn constant(
        &self,
        node: SyntaxNode<'c>,
        visiting: &mut Vec<SyntaxNode<'c>>,
    ) -> Option<Constant> {
        match node.kind() {
            "string_literal" => decode_string_literal(self.text(node)).map(Constant::Str),
            "character_literal" => decode_char_literal(self.text(node)).map(Constant::Char),
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => parse_int(self.text(node)),
            "true" => Some(Constant::Bool(true)),
            "false" => Some(Constant::Bool(false)),
            "parenthesized_expression" => {
                let inner = *node.children().first()?;
                self.constant(inner, visiting)
            }
            "unary_expression" => {
                let operand_node = node.field("operand")?;
                let operator = node.field("operator")?.kind();
                // `-2147483648` is the one decimal int literal that only exists negated
                if operator == "-" && self.text(operand_node).replace('_', "") == "2147483648" {
                    return Some(Constant::Int(i32::MIN));
                }
                let operand = self.constant(operand_node, visiting)?;
                match operator {
                    "-" => negate(operand),
                    "+" => operand.as_long().is_some().then_some(operand),
                    _ => None,
                }
            }
            "binary_expression" => {
                let operator = node.field("operator")?.kind();
                let left = self.constant(node.field("left")?, visiting)?;
                let right = self.constant(node.field("right")?, visiting)?;
                fold(operator, left, right)
            }
            "identifier" => {
                let name = self.text(node);
                let binding = self
                    .lookup(node, name)
                    .or_else(|| self.static_import_field(node, name))?;
                self.binding_constant(binding, visiting)
            }
            "field_access" => {
                let binding = self.qualified_field(node)?;
                self.binding_constant(binding, visiting)
            }
            _ => None,
        }
    }

    fn binding_constant(
        &self,
        binding: Binding<'c>,
        visiting: &mut Vec<SyntaxNode<'c>>,
    ) -> Option<Constant> {
        if !binding.is_final || visiting.len() >= MAX_DEPTH {
            return None;
        }
        let value = binding.value?;
        if visiting.contains(&binding.declarator) {
            return None;
        }
        visiting.push(binding.declarator);
        let result = self.constant(value, visiting);
        visiting.pop();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::JavaCorpus;
    use crate::syntax::{AstAccessor, CorpusIndex, Syntax};

    /// String value of the second argument of the first `eval("@eval", ...)`.
    fn eval(sources: &[(&str, &str)]) -> Option<String> {
        let corpus = JavaCorpus::from_sources(
            sources
                .iter()
                .map(|(p, s)| (p.into(), s.to_string()))
                .collect(),
        );
        let host = corpus.host();
        let marker = host.find_literal_occurrences("@eval")[0];
        let list = host.parent(marker)?;
        let Syntax::ArgumentList(args) = host.syntax(list) else {
            return None;
        };
        host.evaluate_constant(*args.get(1)?)
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), Some(Constant::Int(42)));
        assert_eq!(parse_int("1_000L"), Some(Constant::Long(1000)));
        assert_eq!(parse_int("0x1F"), Some(Constant::Int(31)));
        assert_eq!(parse_int("0b101"), Some(Constant::Int(5)));
        assert_eq!(parse_int("017"), Some(Constant::Int(15)));
        assert_eq!(parse_int("0"), Some(Constant::Int(0)));
        assert_eq!(parse_int("0xFFFFFFFF"), Some(Constant::Int(-1)));
        assert_eq!(parse_int("2147483648"), None);
        assert_eq!(parse_int("2147483648L"), Some(Constant::Long(2_147_483_648)));
    }

    #[test]
    fn test_int_arithmetic_wraps_at_32_bits() {
        let src = r#"class A { void f() { eval("@eval", "ns." + (2147483647 + 1)); } }"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("ns.-2147483648"));

        let src = r#"class A { void f() { eval("@eval", "ns." + (2147483647L + 1)); } }"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("ns.2147483648"));

        let src = r#"class A { void f() { eval("@eval", "ns." + -2147483648 + 'a' * 2); } }"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("ns.-2147483648194"));

        let src = r#"class A { void f() { eval("@eval", "ns." + -(3 - 5) + 'a' * 2); } }"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("ns.2194"));
    }

    #[test]
    fn test_string_concatenation_semantics() {
        let src = r#"class A { void f() { eval("@eval", "a" + 1 + 2); eval("@eval2", 1 + 2 + "a"); } }"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("a12"));

        let src = r#"class A { void f() { eval("@eval", 1 + 2 + "a" + 'c' + true); } }"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("3actrue"));
    }

    #[test]
    fn test_non_string_is_not_a_string_constant() {
        let src = r#"class A { void f() { eval("@eval", 1 + 2); } }"#;
        assert_eq!(eval(&[("A.java", src)]), None);
    }

    #[test]
    fn test_final_local_and_field() {
        let src = r#"
class A {
    static final String NS = "ns" + ".";
    void f() {
        final String id = "sqlId";
        eval("@eval", (NS) + id);
    }
}"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("ns.sqlId"));
    }

    #[test]
    fn test_non_final_local_is_not_constant() {
        let src = r#"class A { void f() { String id = "sqlId"; eval("@eval", "ns." + id); } }"#;
        assert_eq!(eval(&[("A.java", src)]), None);
    }

    #[test]
    fn test_qualified_and_static_imported_fields() {
        let keys = r#"
package com.acme;
public interface Keys {
    String NS = "ns.";
    String ID = NS + "sqlId";
}"#;
        let dao = r#"
package app;
import com.acme.Keys;
import static com.acme.Keys.NS;
class Dao {
    void f() {
        eval("@eval", Keys.ID + "|" + NS + com.acme.Keys.NS);
    }
}"#;
        assert_eq!(
            eval(&[("Keys.java", keys), ("Dao.java", dao)]).as_deref(),
            Some("ns.sqlId|ns.ns.")
        );
    }

    #[test]
    fn test_cyclic_constants() {
        let src = r#"
class A {
    static final String X = Y + "x";
    static final String Y = X + "y";
    void f() { eval("@eval", X); }
}"#;
        assert_eq!(eval(&[("A.java", src)]), None);
    }

    #[test]
    fn test_shadowing_local_wins() {
        let src = r#"
class A {
    static final String NS = "ns.";
    void f() {
        final String NS = "other.";
        eval("@eval", NS + "sqlId");
    }
}"#;
        assert_eq!(eval(&[("A.java", src)]).as_deref(), Some("other.sqlId"));
    }
}
