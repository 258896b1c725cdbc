//! Target-string matching for literal occurrences.
//!
//! A literal containing the statement id is only interesting if the
//! expression around it evaluates to the statement's full name. Three
//! strategies are tried in order, first success wins:
//!
//! 1. `LiteralEqual`: `"ns.sqlId"`
//! 2. `BinaryFold`: `NS + "sqlId"` with `NS` a constant
//! 3. `ConcatFold`: `"ns".concat(".").concat("sqlId")`

use serde::Serialize;
use tracing::debug;

use crate::error::TraceError;
use crate::statement::TargetStatement;
use crate::syntax::{ancestors, strip_enclosing_parens, unwrap_parens, AstAccessor, Syntax};

/// Method name recognised as a chained concatenation link.
const CONCAT: &str = "concat";

/// How an evidence node was proven equal to the full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchStrategy {
    LiteralEqual,
    BinaryFold,
    ConcatFold,
}

/// Proof that `node` evaluates to the target full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchEvidence<N> {
    pub node: N,
    pub strategy: MatchStrategy,
}

/// Matches literal occurrences against one statement's full name.
pub struct Matcher<'h, H: AstAccessor + ?Sized> {
    host: &'h H,
    full_name: String,
}

impl<'h, H: AstAccessor + ?Sized> Matcher<'h, H> {
    pub fn new(host: &'h H, statement: &TargetStatement) -> Self {
        Self {
            host,
            full_name: statement.full_name(),
        }
    }

    /// Evidence for `literal`, or `None` if no strategy applies.
    pub fn matches(&self, literal: H::Node) -> Option<MatchEvidence<H::Node>> {
        self.literal_equal(literal)
            .or_else(|| self.binary_fold(literal))
            .or_else(|| self.concat_fold(literal))
    }

    fn literal_equal(&self, literal: H::Node) -> Option<MatchEvidence<H::Node>> {
        match self.host.syntax(literal) {
            Syntax::Literal(value) if value == self.full_name => Some(MatchEvidence {
                node: literal,
                strategy: MatchStrategy::LiteralEqual,
            }),
            _ => None,
        }
    }

    /// Climb through parentheses and `+` operands; the first binary that
    /// folds to the full name is the evidence.
    fn binary_fold(&self, literal: H::Node) -> Option<MatchEvidence<H::Node>> {
        let mut child = literal;
        for ancestor in ancestors(self.host, literal) {
            let operand = child;
            child = ancestor;
            match self.host.syntax(ancestor) {
                Syntax::Parenthesized(inner) if inner == operand => continue,
                Syntax::Binary { left, right } if left == operand || right == operand => {
                    let folded = self.host.evaluate_constant(ancestor);
                    if folded.as_deref() == Some(self.full_name.as_str()) {
                        return Some(MatchEvidence {
                            node: ancestor,
                            strategy: MatchStrategy::BinaryFold,
                        });
                    }
                }
                _ => break,
            }
        }
        None
    }

    fn concat_fold(&self, literal: H::Node) -> Option<MatchEvidence<H::Node>> {
        let start = self.chain_link_of(literal)?;
        let outermost = self.outermost_link(start);

        match self.fold_chain(outermost) {
            Ok(value) if value == self.full_name => Some(MatchEvidence {
                node: outermost,
                strategy: MatchStrategy::ConcatFold,
            }),
            Ok(_) => None,
            Err(err) => {
                debug!(error = %err, full_name = %self.full_name, "concat chain rejected");
                None
            }
        }
    }

    /// The `concat` call that `literal` takes part in, either as its
    /// argument or as the root receiver.
    fn chain_link_of(&self, literal: H::Node) -> Option<H::Node> {
        let operand = strip_enclosing_parens(self.host, literal);
        let parent = self.host.parent(operand)?;
        match self.host.syntax(parent) {
            Syntax::ArgumentList(_) => {
                let call = self.host.parent(parent)?;
                self.is_concat(call).then_some(call)
            }
            Syntax::Call(call) if call.method == CONCAT && call.receiver == Some(operand) => {
                Some(parent)
            }
            _ => None,
        }
    }

    fn is_concat(&self, node: H::Node) -> bool {
        matches!(self.host.syntax(node), Syntax::Call(call) if call.method == CONCAT)
    }

    /// Follow the chain upward while each parent is a `concat` applied to it.
    fn outermost_link(&self, start: H::Node) -> H::Node {
        let mut current = start;
        loop {
            let wrapped = strip_enclosing_parens(self.host, current);
            let Some(parent) = self.host.parent(wrapped) else {
                return current;
            };
            match self.host.syntax(parent) {
                Syntax::Call(call) if call.method == CONCAT && call.receiver == Some(wrapped) => {
                    current = parent;
                }
                _ => return current,
            }
        }
    }

    /// Evaluate `receiver.concat(a).concat(b)` as `receiver + a + b`.
    ///
    /// Every link must be `concat` with exactly one string literal argument
    /// and the innermost receiver must be a string literal.
    fn fold_chain(&self, outermost: H::Node) -> Result<String, TraceError> {
        let mut parts = Vec::new();
        let mut current = unwrap_parens(self.host, outermost);
        loop {
            match self.host.syntax(current) {
                Syntax::Literal(value) => {
                    parts.push(value);
                    break;
                }
                Syntax::Call(call) if call.method == CONCAT => {
                    let [argument] = call.arguments.as_slice() else {
                        return Err(TraceError::ambiguous_chain(format!(
                            "concat with {} arguments",
                            call.arguments.len()
                        )));
                    };
                    match self.host.syntax(unwrap_parens(self.host, *argument)) {
                        Syntax::Literal(value) => parts.push(value),
                        _ => return Err(TraceError::ambiguous_chain("argument is not a literal")),
                    }
                    current = match call.receiver {
                        Some(receiver) => unwrap_parens(self.host, receiver),
                        None => return Err(TraceError::ambiguous_chain("concat without receiver")),
                    };
                }
                Syntax::Call(call) => {
                    return Err(TraceError::ambiguous_chain(format!(
                        "'{}' link in chain",
                        call.method
                    )));
                }
                _ => return Err(TraceError::ambiguous_chain("receiver is not a literal")),
            }
        }
        parts.reverse();
        Ok(parts.concat())
    }
}
