//! The declared statement whose call sites are being located.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SqlmarkError;

/// A named statement: `id` inside `namespace`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetStatement {
    pub id: String,
    pub namespace: String,
}

impl TargetStatement {
    pub fn new(namespace: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            namespace: namespace.into(),
        }
    }

    /// `namespace + "." + id`, the value call sites must pass.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.id)
    }

    /// Parse a dotted full name, splitting at the last `.`.
    ///
    /// `com.example.UserMapper.selectById` becomes namespace
    /// `com.example.UserMapper` and id `selectById`.
    pub fn parse(full_name: &str) -> Result<Self, SqlmarkError> {
        let full_name = full_name.trim();
        match full_name.rsplit_once('.') {
            Some((namespace, id)) if !namespace.is_empty() && !id.is_empty() => {
                Ok(Self::new(namespace, id))
            }
            _ => Err(SqlmarkError::invalid_argument(format!(
                "statement '{}' must be written as <namespace>.<id>",
                full_name
            ))),
        }
    }
}

impl fmt::Display for TargetStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.id)
    }
}
