//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use sqlmark_core::prelude::*;
//! ```

// Builder API
pub use crate::builder::{AnalysisResult, AnalysisStats, Sqlmark};

// Core resolution
pub use crate::cancel::{Cancellable, CancellationToken};
pub use crate::resolver::{resolve, Resolution, ResolutionStats};
pub use crate::statement::TargetStatement;
pub use crate::syntax::CallSite;

// Errors
pub use crate::error::{ResolveError, SqlmarkError, SqlmarkResult};

// Hosts
pub use crate::java::JavaCorpus;
pub use crate::mapper::{discover_statements, DeclaredStatement, StatementKind};

// Configuration
pub use crate::config::{load_config, SqlmarkConfig};
