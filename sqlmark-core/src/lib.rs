//! sqlmark-core: find the Java call sites of MyBatis mapper statements
//!
//! Given a declared statement (`namespace` + `id`) and the data-access class
//! the project calls with statement names, this library locates every call on
//! that class whose first argument evaluates to `namespace.id`, even when the
//! name is assembled from constants, concatenation or `String.concat`.
//!
//! # Features
//!
//! - **Literal matching**: `DBUtils.selectList("ns.sqlId", p)`
//! - **Constant folding**: `NS + "sqlId"` with `static final String NS = "ns."`
//! - **Concat chains**: `"ns".concat(".").concat("sqlId")`
//! - **Indirection**: names stored in locals or fields and passed on later
//! - **Mapper discovery**: statements read from `<mapper>` XML files
//! - **Cooperative cancellation** of long resolutions
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sqlmark_core::prelude::*;
//!
//! let result = Sqlmark::new("/path/to/project")
//!     .tool_class("com.example.DBUtils")
//!     .analyze()?;
//!
//! for statement in result.unused() {
//!     println!("never called: {}", statement);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`resolver`]: `resolve`, the per-statement pipeline
//! - [`matcher`]: proves a literal occurrence evaluates to the full name
//! - [`tracer`]: follows evidence to calls on the data-access class
//! - [`syntax`]: the traits a source host implements for the core
//! - [`java`]: tree-sitter backed Java host
//! - [`mapper`]: MyBatis mapper XML declarations
//! - [`scan`]: parallel file discovery
//! - [`builder`]: fluent builder API for configuration
//! - [`error`]: typed error handling

pub mod builder;
pub mod cancel;
pub mod config;
pub mod error;
pub mod java;
pub mod logging;
pub mod mapper;
pub mod matcher;
pub mod prelude;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod statement;
pub mod syntax;
pub mod tracer;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{IoResultExt, ResolveError, SqlmarkError, SqlmarkResult, TraceError};

// Builder API
pub use builder::{AnalysisResult, AnalysisStats, Sqlmark};

// Cancellation
pub use cancel::{Cancellable, CancellationToken};

// Configuration
pub use config::{load_config, OutputConfig, SqlmarkConfig, CONFIG_FILE};

// Core resolution
pub use matcher::{MatchEvidence, MatchStrategy, Matcher};
pub use resolver::{resolve, Resolution, ResolutionStats};
pub use statement::TargetStatement;
pub use syntax::{
    ancestors, AstAccessor, CallExpr, CallSite, CallTarget, CorpusIndex, ReferenceSearch,
    SourceHost, Syntax,
};
pub use tracer::Tracer;

// Hosts
pub use java::{JavaCorpus, JavaHost};
pub use mapper::{discover_statements, parse_mapper, DeclaredStatement, StatementKind};

// Logging
pub use logging::{
    init_structured_logging, log_error, log_event, log_info, log_skipped, log_warn,
};

// Reporting
pub use report::{print_json, print_plain, render_plain};

// File scanning
pub use scan::{gather_java_files, gather_xml_files, EXCLUDED_DIRS};
