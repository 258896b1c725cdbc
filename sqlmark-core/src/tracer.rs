//! Usage tracing from an evidence node to target API call sites.
//!
//! The value of an evidence node can reach a call in three ways:
//!
//! - **Direct**: `DBUtils.selectList("ns.sqlId", p)`
//! - **Local variable**: `String id = ...; DBUtils.selectList(id, p)`
//! - **Field**: `static final String ID = ...;` then `DBUtils.selectList(ID, p)` anywhere
//!
//! In every case the value must be the first argument of a call whose
//! declaring type is the configured API class.

use std::collections::HashSet;
use tracing::debug;

use crate::cancel::{Cancellable, CancellationToken};
use crate::error::TraceError;
use crate::matcher::MatchEvidence;
use crate::syntax::{strip_enclosing_parens, ReferenceSearch, Syntax};

/// Which declaration an evidence node initializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Local,
    Field,
}

/// Traces evidence nodes to calls on one API class.
pub struct Tracer<'h, H: ReferenceSearch + ?Sized> {
    host: &'h H,
    target_api: &'h str,
    cancel: &'h CancellationToken,
}

impl<'h, H: ReferenceSearch + ?Sized> Tracer<'h, H> {
    pub fn new(host: &'h H, target_api: &'h str, cancel: &'h CancellationToken) -> Self {
        Self {
            host,
            target_api,
            cancel,
        }
    }

    /// Calls reached by the evidence's value, each at most once.
    ///
    /// Only cancellation is reported as an error; failed sub-searches
    /// contribute nothing.
    pub fn trace(&self, evidence: &MatchEvidence<H::Node>) -> Result<Vec<H::Node>, TraceError> {
        let mut calls = self.direct_usages(evidence.node);
        calls.extend(self.binding_usages(evidence.node, Binding::Local)?);
        calls.extend(self.binding_usages(evidence.node, Binding::Field)?);

        let mut seen = HashSet::with_capacity(calls.len());
        calls.retain(|call| seen.insert(*call));
        Ok(calls)
    }

    fn direct_usages(&self, expr: H::Node) -> Vec<H::Node> {
        self.qualifying_call(expr).into_iter().collect()
    }

    fn binding_usages(&self, expr: H::Node, binding: Binding) -> Result<Vec<H::Node>, TraceError> {
        let Some((declarator, name)) = self.declarator_initialized_by(expr, binding) else {
            return Ok(Vec::new());
        };
        self.check_cancelled()?;

        let references = match self.host.find_references(declarator) {
            Ok(refs) => refs,
            Err(err) if err.is_cancellation() => return Err(err),
            Err(err) => {
                debug!(error = %err, ?binding, "reference search failed");
                return Ok(Vec::new());
            }
        };

        let mut calls = Vec::new();
        for reference in references {
            self.check_cancelled()?;
            match self.host.syntax(reference) {
                Syntax::Reference(used) if used == name => {}
                _ => {
                    debug!(?binding, name = %name, "reference no longer names the declaration");
                    continue;
                }
            }
            if let Some(call) = self.qualifying_call(reference) {
                calls.push(call);
            }
        }
        Ok(calls)
    }

    /// The declarator whose initializer is `expr` and its declared name, if
    /// the declaration is of the requested kind.
    fn declarator_initialized_by(
        &self,
        expr: H::Node,
        binding: Binding,
    ) -> Option<(H::Node, String)> {
        let value = strip_enclosing_parens(self.host, expr);
        let declarator = self.host.parent(value)?;
        let name = match self.host.syntax(declarator) {
            Syntax::Declarator {
                name,
                value: Some(init),
            } if init == value => name,
            _ => return None,
        };

        let declaration = self.host.parent(declarator)?;
        let kind = match self.host.syntax(declaration) {
            Syntax::LocalVarDecl => Binding::Local,
            Syntax::FieldDecl => Binding::Field,
            _ => return None,
        };
        (kind == binding).then_some((declarator, name))
    }

    /// The call consuming `expr` as its first argument, if that call
    /// resolves to the target API.
    fn qualifying_call(&self, expr: H::Node) -> Option<H::Node> {
        let argument = strip_enclosing_parens(self.host, expr);
        let list = self.host.parent(argument)?;
        match self.host.syntax(list) {
            Syntax::ArgumentList(arguments) if arguments.first() == Some(&argument) => {}
            _ => return None,
        }

        let call = self.host.parent(list)?;
        if !matches!(self.host.syntax(call), Syntax::Call(_)) {
            return None;
        }

        match self.host.resolve_call_target(call) {
            Ok(target) if target.declaring_type == self.target_api => Some(call),
            Ok(_) => None,
            Err(err) => {
                debug!(error = %err, "call target not resolvable");
                None
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), TraceError> {
        if self.cancel.is_cancelled() {
            Err(TraceError::Cancelled)
        } else {
            Ok(())
        }
    }
}
