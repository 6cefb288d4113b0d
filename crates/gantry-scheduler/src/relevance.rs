//! Path-filter relevance evaluation.
//!
//! A job is skipped for an event iff every changed file matches at least
//! one of the job's irrelevant-file patterns. Pure predicate, no side
//! effects.

use gantry_core::{Error, Result};
use regex::Regex;

/// A compiled irrelevant-file pattern set for one job.
///
/// Patterns are regex anchored over the repository-relative path: `doc/.*`
/// matches `doc/readme.rst` but not `x/doc/readme.rst`.
pub struct PathFilter {
    patterns: Vec<Regex>,
}

impl PathFilter {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether a run with these changed files is relevant. An empty changed
    /// set (manual trigger) or an empty pattern set is always relevant.
    pub fn is_relevant(&self, changed_files: &[String]) -> bool {
        if changed_files.is_empty() || self.patterns.is_empty() {
            return true;
        }
        !changed_files
            .iter()
            .all(|file| self.patterns.iter().any(|re| re.is_match(file)))
    }
}

/// One-shot convenience over [`PathFilter`].
pub fn is_relevant(changed_files: &[String], patterns: &[String]) -> Result<bool> {
    Ok(PathFilter::compile(patterns)?.is_relevant(changed_files))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn patterns(pats: &[&str]) -> Vec<String> {
        pats.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_all_changed_files_covered_is_irrelevant() {
        let relevant = is_relevant(
            &files(&["doc/readme.rst", "doc/install.rst"]),
            &patterns(&["doc/.*"]),
        )
        .unwrap();
        assert!(!relevant);
    }

    #[test]
    fn test_one_uncovered_file_keeps_job_relevant() {
        let relevant = is_relevant(
            &files(&["doc/readme.rst", "src/main.rs"]),
            &patterns(&["doc/.*"]),
        )
        .unwrap();
        assert!(relevant);
    }

    #[test]
    fn test_empty_changed_files_is_relevant() {
        assert!(is_relevant(&[], &patterns(&["doc/.*"])).unwrap());
    }

    #[test]
    fn test_empty_patterns_is_relevant() {
        assert!(is_relevant(&files(&["doc/readme.rst"]), &[]).unwrap());
    }

    #[test]
    fn test_patterns_are_anchored() {
        // Not a prefix match: a pattern must cover the whole path.
        let relevant = is_relevant(
            &files(&["x/doc/readme.rst"]),
            &patterns(&["doc/.*"]),
        )
        .unwrap();
        assert!(relevant);

        let relevant = is_relevant(&files(&["doc2/readme.rst"]), &patterns(&["doc"])).unwrap();
        assert!(relevant);
    }

    #[test]
    fn test_multiple_patterns_union() {
        let relevant = is_relevant(
            &files(&["doc/readme.rst", "releasenotes/notes/x.yaml"]),
            &patterns(&["doc/.*", "releasenotes/.*"]),
        )
        .unwrap();
        assert!(!relevant);
    }

    #[test]
    fn test_invalid_pattern_surfaces() {
        let err = is_relevant(&files(&["a"]), &patterns(&["("])).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
