//! Collaborator interfaces the resolution core is written against.
//!
//! The core never sees a concrete parser. A host (see [`crate::java`])
//! implements three traits:
//!
//! ```text
//! ┌─────────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │    AstAccessor      │   │    CorpusIndex      │   │  ReferenceSearch    │
//! │  ─────────────────  │   │  ─────────────────  │   │  ─────────────────  │
//! │  parent, classify,  │◄──│  literal occurrences│   │  references, call   │
//! │  constant folding   │   │  of a substring     │   │  target resolution  │
//! └─────────────────────┘   └─────────────────────┘   └─────────────────────┘
//! ```
//!
//! Nodes are opaque `Copy` handles whose equality is AST identity.

use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;

use crate::error::TraceError;

/// Closed classification of the node kinds the matcher and tracer care about.
///
/// Everything else is [`Syntax::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syntax<N> {
    /// String literal with its decoded value.
    Literal(String),
    /// `left + right`.
    Binary { left: N, right: N },
    /// `( inner )`.
    Parenthesized(N),
    /// Method call: `receiver.method(arguments)`.
    Call(CallExpr<N>),
    /// Argument list of a call, in positional order.
    ArgumentList(Vec<N>),
    /// One declared name with its optional initializer.
    Declarator { name: String, value: Option<N> },
    /// Local variable declaration statement (parent of declarators).
    LocalVarDecl,
    /// Field or interface constant declaration (parent of declarators).
    FieldDecl,
    /// A name used as an expression.
    Reference(String),
    Other,
}

/// Parts of a method call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr<N> {
    pub receiver: Option<N>,
    pub method: String,
    pub arguments: Vec<N>,
}

/// Name resolution result for a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTarget {
    /// Fully qualified name of the type declaring the invoked method.
    pub declaring_type: String,
    pub method: String,
}

/// A call expression proven to invoke the target API with the statement id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CallSite {
    pub file: PathBuf,
    /// 1-indexed
    pub line: usize,
    /// 1-indexed
    pub column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
    pub method: String,
    /// First line of the call text.
    pub snippet: String,
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}  {}",
            self.file.display(),
            self.line,
            self.column,
            self.snippet
        )
    }
}

/// Read-only navigation over the syntax tree.
pub trait AstAccessor {
    type Node: Copy + Eq + Hash + fmt::Debug;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    fn syntax(&self, node: Self::Node) -> Syntax<Self::Node>;

    /// Statically evaluate `node` to a string, or `None` if it is not a
    /// compile-time constant.
    fn evaluate_constant(&self, node: Self::Node) -> Option<String>;

    /// Location data for a call node; `None` if `node` is not a call.
    fn call_site(&self, node: Self::Node) -> Option<CallSite>;
}

/// Corpus-wide lookup of string literals.
pub trait CorpusIndex: AstAccessor {
    /// Every string literal whose value contains `needle`.
    fn find_literal_occurrences(&self, needle: &str) -> Vec<Self::Node>;
}

/// Name resolution services.
pub trait ReferenceSearch: AstAccessor {
    /// All use sites of the variable or field declared by `declarator`.
    ///
    /// Each returned node is the full expression naming the declaration
    /// (`ID`, `this.ID`, `Sql.ID`).
    fn find_references(&self, declarator: Self::Node) -> Result<Vec<Self::Node>, TraceError>;

    fn resolve_call_target(&self, call: Self::Node) -> Result<CallTarget, TraceError>;
}

/// Everything `resolve` needs from a host.
pub trait SourceHost: CorpusIndex + ReferenceSearch {}

impl<T: CorpusIndex + ReferenceSearch> SourceHost for T {}

/// Iterator over the strict ancestors of a node, nearest first.
pub struct Ancestors<'h, H: AstAccessor + ?Sized> {
    host: &'h H,
    next: Option<H::Node>,
}

impl<H: AstAccessor + ?Sized> Iterator for Ancestors<'_, H> {
    type Item = H::Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.host.parent(current);
        Some(current)
    }
}

/// Ancestors of `node`, excluding `node` itself.
pub fn ancestors<H: AstAccessor + ?Sized>(host: &H, node: H::Node) -> Ancestors<'_, H> {
    Ancestors {
        host,
        next: host.parent(node),
    }
}

/// Climb out of any parentheses wrapping `node`.
///
/// `(("a"))` yields the outermost parenthesized expression, so that the
/// result is the node its parent actually consumes.
pub fn strip_enclosing_parens<H: AstAccessor + ?Sized>(host: &H, node: H::Node) -> H::Node {
    let mut current = node;
    for parent in ancestors(host, node) {
        match host.syntax(parent) {
            Syntax::Parenthesized(_) => current = parent,
            _ => break,
        }
    }
    current
}

/// Descend through parentheses to the wrapped expression.
pub fn unwrap_parens<H: AstAccessor + ?Sized>(host: &H, node: H::Node) -> H::Node {
    let mut current = node;
    while let Syntax::Parenthesized(inner) = host.syntax(current) {
        current = inner;
    }
    current
}
