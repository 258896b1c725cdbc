//! Java source host backed by tree-sitter.
//!
//! [`JavaCorpus`] owns every parsed file of a project; [`JavaHost`] is the
//! cheap `Copy` view the resolution core runs against.
//!
//! ```text
//! paths ──► read (rayon) ──► parse (one Parser per worker) ──► SourceFile
//!                                                               ├─ package, imports
//!                                                               ├─ declared classes
//!                                                               └─ literal index
//! ```

mod constant;
mod host;
mod literal;
mod references;
mod scope;
mod source;
mod types;

pub use host::{JavaHost, SyntaxNode};
pub use literal::{decode_char_literal, decode_string_literal};
pub use source::{Import, SourceFile};

use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tree_sitter::Parser;

use crate::error::{IoResultExt, SqlmarkError, SqlmarkResult};
use crate::logging::log_skipped;

/// Index of a file inside its corpus.
pub type FileId = usize;

/// Maximum file size to parse (10 MB).
const MAX_FILE_SIZE: usize = 10_000_000;

/// Where a declared type lives.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClassLocation {
    pub file: FileId,
    pub start_byte: usize,
    pub end_byte: usize,
}

/// Every parsed Java file of one analysis, plus a corpus-wide type table.
pub struct JavaCorpus {
    files: Vec<SourceFile>,
    classes: HashMap<String, ClassLocation>,
}

impl JavaCorpus {
    /// Read and parse `paths` in parallel. Unreadable files are logged and skipped.
    pub fn load(paths: &[PathBuf]) -> Self {
        let sources: Vec<(PathBuf, String)> = paths
            .par_iter()
            .filter_map(|path| match read_source(path) {
                Ok(source) => Some((path.clone(), source)),
                Err(e) => {
                    log_skipped(path, &e);
                    None
                }
            })
            .collect();
        Self::from_sources(sources)
    }

    /// Build a corpus from in-memory `(path, source)` pairs, keeping their order.
    pub fn from_sources(sources: Vec<(PathBuf, String)>) -> Self {
        let parsed: Vec<Option<SourceFile>> = sources
            .into_par_iter()
            .map_init(new_parser, |parser, (path, source)| {
                let parser = match parser {
                    Ok(parser) => parser,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "no parser available");
                        return None;
                    }
                };
                let file = SourceFile::parse(parser, path, source);
                if let Some(error) = file.as_ref().and_then(SourceFile::first_syntax_error) {
                    debug!(%error, "partial tree kept");
                }
                file
            })
            .collect();

        let files: Vec<SourceFile> = parsed.into_iter().flatten().collect();

        let mut classes = HashMap::new();
        for (id, file) in files.iter().enumerate() {
            for class in &file.classes {
                classes
                    .entry(class.fqn.clone())
                    .or_insert(ClassLocation {
                        file: id,
                        start_byte: class.start_byte,
                        end_byte: class.end_byte,
                    });
            }
        }

        debug!(files = files.len(), classes = classes.len(), "java corpus loaded");
        Self { files, classes }
    }

    pub fn host(&self) -> JavaHost<'_> {
        JavaHost::new(self)
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Is `fqn` declared somewhere in the corpus?
    pub fn declares_class(&self, fqn: &str) -> bool {
        self.classes.contains_key(fqn)
    }

    pub(crate) fn class_location(&self, fqn: &str) -> Option<ClassLocation> {
        self.classes.get(fqn).copied()
    }
}

fn new_parser() -> SqlmarkResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| SqlmarkError::Internal {
            message: format!("Failed to set language: {}", e),
        })?;
    Ok(parser)
}

fn read_source(path: &Path) -> SqlmarkResult<String> {
    let content = fs::read_to_string(path).with_path(path)?;
    if content.len() > MAX_FILE_SIZE {
        return Err(SqlmarkError::parse(
            path,
            format!("File too large ({} bytes, max {})", content.len(), MAX_FILE_SIZE),
        ));
    }
    Ok(content)
}
