//! Input path expansion

use std::path::PathBuf;

use glob::glob;
use log::warn;

use crate::error::{Error, Result};

/// Expand glob patterns in input paths
///
/// Patterns without `*`, `?` or `[` are taken literally. The result is sorted
/// so numbered files merge in order.
pub fn expand_globs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        if !is_glob(pattern) {
            paths.push(PathBuf::from(pattern));
            continue;
        }

        let entries = glob(pattern).map_err(|e| Error::InvalidGlob(format!("{}: {}", pattern, e)))?;
        let mut matched = false;
        for entry in entries {
            match entry {
                Ok(path) => {
                    paths.push(path);
                    matched = true;
                }
                Err(e) => warn!("glob error for {}: {}", pattern, e),
            }
        }
        if !matched {
            return Err(Error::NoFilesMatched(pattern.to_string()));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_literal_paths_kept_and_sorted() {
        let paths = expand_globs(&["b.pdf", "a.pdf"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
    }

    #[test]
    fn test_glob_matches_sorted() {
        let dir = TempDir::new().unwrap();
        for name in ["2. second.pdf", "1. first.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let pattern = format!("{}/*.pdf", dir.path().display());
        let paths = expand_globs(&[pattern]).unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("1. first.pdf"), dir.path().join("2. second.pdf")]
        );
    }

    #[test]
    fn test_unmatched_glob() {
        let dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.pdf", dir.path().display());
        assert!(matches!(expand_globs(&[pattern]), Err(Error::NoFilesMatched(_))));
    }

    #[test]
    fn test_invalid_glob() {
        assert!(matches!(expand_globs(&["[*.pdf"]), Err(Error::InvalidGlob(_))));
    }
}
