//! Parallel, deterministic file discovery with efficient directory pruning.
//!
//! Performance optimizations:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel file processing via Rayon's `par_bridge`
//! - Minimal work in parallel threads (only an extension check)

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories to exclude by default (build output and tool state of Java projects).
pub const EXCLUDED_DIRS: &[&str] = &[
    "target",
    "build",
    "out",
    ".git",
    ".idea",
    ".gradle",
    "node_modules",
];

/// Checks if a directory entry should be pruned (excluded from traversal).
///
/// This is called by `WalkDir::filter_entry` and runs sequentially,
/// but enables O(1) subtree skipping for excluded directories.
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Walks `root` and collects files with `extension`, skipping the default
/// and custom excluded directories. Sorted for deterministic output.
fn gather_files(root: &Path, extension: &str, excludes: &[String]) -> Result<Vec<PathBuf>> {
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().map(String::as_str))
        .collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        // CRITICAL: filter_entry prunes entire subtrees before iteration
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if e.file_type().is_file() && path.extension().is_some_and(|ext| ext == extension) {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to gather .{} files from {}", extension, root.display()))?;

    files.sort();
    Ok(files)
}

/// Gathers all `.java` files under `root`.
pub fn gather_java_files(root: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    gather_files(root, "java", excludes)
}

/// Gathers all `.xml` files under `root` (candidate MyBatis mappers).
pub fn gather_xml_files(root: &Path, excludes: &[String]) -> Result<Vec<PathBuf>> {
    gather_files(root, "xml", excludes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_test_project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sqlmark_scan_{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }

        // src/main/java/app/Dao.java
        // src/main/java/app/Util.java
        // src/main/resources/mapper/UserMapper.xml
        // target/classes/app/Dao.java        (excluded)
        // generated/Gen.java                 (custom exclude)
        let java = dir.join("src/main/java/app");
        let res = dir.join("src/main/resources/mapper");
        fs::create_dir_all(&java).unwrap();
        fs::create_dir_all(&res).unwrap();
        fs::create_dir_all(dir.join("target/classes/app")).unwrap();
        fs::create_dir_all(dir.join("generated")).unwrap();

        fs::write(java.join("Dao.java"), "class Dao {}").unwrap();
        fs::write(java.join("Util.java"), "class Util {}").unwrap();
        fs::write(java.join("notes.txt"), "not java").unwrap();
        fs::write(res.join("UserMapper.xml"), "<mapper/>").unwrap();
        fs::write(dir.join("target/classes/app/Dao.java"), "class Dao {}").unwrap();
        fs::write(dir.join("generated/Gen.java"), "class Gen {}").unwrap();
        dir
    }

    #[test]
    fn test_gather_java_files_sorted_and_pruned() {
        let dir = create_test_project("java");
        let files = gather_java_files(&dir, &[]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&dir).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(
            names,
            vec![
                "generated/Gen.java",
                "src/main/java/app/Dao.java",
                "src/main/java/app/Util.java"
            ]
        );
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_custom_excludes() {
        let dir = create_test_project("excl");
        let files = gather_java_files(&dir, &["generated".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| !f.to_string_lossy().contains("generated")));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_gather_xml_files() {
        let dir = create_test_project("xml");
        let files = gather_xml_files(&dir, &[]).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("UserMapper.xml"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_root_is_error() {
        let missing = std::env::temp_dir().join("sqlmark_scan_missing_root_xyz");
        assert!(gather_java_files(&missing, &[]).is_err());
    }

    #[test]
    fn test_root_named_like_excluded_dir_is_walked() {
        let dir = std::env::temp_dir().join(format!("sqlmark_scan_root_{}", std::process::id()));
        let root = dir.join("build");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("A.java"), "class A {}").unwrap();
        assert_eq!(gather_java_files(&root, &[]).unwrap().len(), 1);
        fs::remove_dir_all(&dir).ok();
    }
}
