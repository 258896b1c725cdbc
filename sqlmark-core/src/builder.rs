//! Builder pattern API for call-site analysis.
//!
//! Provides a fluent interface for configuring and running an analysis
//! over a Java project:
//!
//! ```rust,ignore
//! use sqlmark_core::prelude::*;
//!
//! let result = Sqlmark::new("/path/to/project")
//!     .tool_class("com.example.DBUtils")
//!     .exclude_dirs(["generated"])
//!     .analyze()?;
//!
//! for resolution in &result.resolutions {
//!     println!("{}: {} call sites", resolution.statement, resolution.call_sites.len());
//! }
//! ```

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::cancel::CancellationToken;
use crate::error::{ResolveError, SqlmarkError, SqlmarkResult};
use crate::java::JavaCorpus;
use crate::mapper::discover_statements;
use crate::resolver::{resolve, Resolution};
use crate::scan::{gather_java_files, gather_xml_files};
use crate::statement::TargetStatement;

/// Builder for configuring call-site analysis.
#[derive(Debug, Clone)]
pub struct Sqlmark {
    /// Root directory of the project to analyze
    root: PathBuf,

    /// Fully qualified data-access class whose calls are reported
    tool_class: String,

    /// Statements to resolve; discovered from mapper XML when empty
    statements: Vec<TargetStatement>,

    /// Custom excluded directories
    excluded_dirs: Vec<String>,

    cancel: CancellationToken,
}

impl Sqlmark {
    /// Create a new analysis builder for the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tool_class: String::new(),
            statements: Vec::new(),
            excluded_dirs: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the data-access class, e.g. `com.example.DBUtils`.
    pub fn tool_class(mut self, fqn: impl Into<String>) -> Self {
        self.tool_class = fqn.into();
        self
    }

    /// Resolve these statements instead of the ones declared in mapper files.
    pub fn statements(mut self, statements: impl IntoIterator<Item = TargetStatement>) -> Self {
        self.statements.extend(statements);
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run the analysis and return results.
    pub fn analyze(&self) -> SqlmarkResult<AnalysisResult> {
        let tool_class = self.tool_class.trim();
        if tool_class.is_empty() {
            return Err(ResolveError::NotConfigured.into());
        }
        let started = Instant::now();

        // 1. Gather files
        let java_files = gather_java_files(&self.root, &self.excluded_dirs)
            .map_err(|e| self.scan_error(e))?;

        // 2. Statements: explicit, or every statement the mapper files declare
        let mut xml_files = 0;
        let requested = if self.statements.is_empty() {
            let files = gather_xml_files(&self.root, &self.excluded_dirs)
                .map_err(|e| self.scan_error(e))?;
            xml_files = files.len();
            discover_statements(&files)
                .into_iter()
                .map(|declared| declared.statement)
                .collect()
        } else {
            self.statements.clone()
        };
        let mut seen = HashSet::new();
        let statements: Vec<TargetStatement> = requested
            .into_iter()
            .filter(|s| seen.insert(s.full_name()))
            .collect();

        // 3. Parse
        let corpus = JavaCorpus::load(&java_files);
        let host = corpus.host();

        // 4. Resolve each statement; the first cancellation aborts the lot
        let resolutions = statements
            .par_iter()
            .map(|statement| resolve(&host, statement, tool_class, &self.cancel))
            .collect::<Result<Vec<Resolution>, ResolveError>>()?;

        let stats = AnalysisStats {
            java_files: corpus.len(),
            xml_files,
            statements: resolutions.len(),
            call_sites: resolutions.iter().map(|r| r.call_sites.len()).sum(),
        };
        info!(
            java_files = stats.java_files,
            statements = stats.statements,
            call_sites = stats.call_sites,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis finished"
        );

        Ok(AnalysisResult {
            root: self.root.clone(),
            resolutions,
            stats,
        })
    }

    fn scan_error(&self, err: anyhow::Error) -> SqlmarkError {
        SqlmarkError::Io {
            path: self.root.clone(),
            message: format!("{:#}", err),
            source: None,
        }
    }
}

/// Counters for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisStats {
    /// Java files parsed
    pub java_files: usize,
    /// XML files inspected for mapper declarations
    pub xml_files: usize,
    /// Statements resolved
    pub statements: usize,
    /// Call sites across all statements
    pub call_sites: usize,
}

/// Result of running call-site analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Root path that was analyzed
    pub root: PathBuf,

    /// One resolution per statement, in request order
    pub resolutions: Vec<Resolution>,

    pub stats: AnalysisStats,
}

impl AnalysisResult {
    /// Statements no call site was found for.
    pub fn unused(&self) -> impl Iterator<Item = &TargetStatement> {
        self.resolutions
            .iter()
            .filter(|r| r.is_empty())
            .map(|r| &r.statement)
    }

    /// The resolution of `full_name`, if it was requested.
    pub fn get(&self, full_name: &str) -> Option<&Resolution> {
        self.resolutions
            .iter()
            .find(|r| r.statement.full_name() == full_name)
    }
}
