use crate::constants::storage;
use crate::errors::OpsError;
use crate::services::logger::Logger;
use crate::utils::fs_atomic::atomic_write_text_file;
use std::collections::BTreeSet;
use std::path::Path;

/// Distinct lines, compared byte for byte. Iteration is sorted so the summary
/// comes out identical for identical input.
pub type LineSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub total: usize,
    pub unique: usize,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    logger: Logger,
    min_line_bytes: usize,
}

impl Deduplicator {
    pub fn new(logger: Logger, min_line_bytes: usize) -> Self {
        Self {
            logger: logger.child("dedup"),
            min_line_bytes,
        }
    }

    pub fn unique<I, S>(&self, lines: I) -> (LineSet, DedupStats)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut total = 0;
        let mut set = LineSet::new();
        for line in lines {
            total += 1;
            let line = line.as_ref();
            if !set.contains(line) {
                set.insert(line.to_string());
            }
        }
        let stats = DedupStats {
            total,
            unique: set.len(),
        };
        self.logger.info(
            "Unique Line Count for Aggregate of All Files",
            Some(&serde_json::json!({ "total": stats.total, "unique": stats.unique })),
        );
        (set, stats)
    }

    /// Lines shorter than the minimum are noise (`ls`, `cd ..`) and are left
    /// out of the summary.
    pub fn summary_lines<'a>(&self, set: &'a LineSet) -> impl Iterator<Item = &'a str> + 'a {
        let min = self.min_line_bytes;
        set.iter().map(String::as_str).filter(move |line| line.len() >= min)
    }

    /// Truncates and rewrites `path`; returns how many lines were written.
    pub fn write_summary(&self, path: &Path, set: &LineSet) -> Result<usize, OpsError> {
        let mut content = String::new();
        let mut written = 0;
        for line in self.summary_lines(set) {
            content.push_str(line);
            content.push('\n');
            written += 1;
        }
        atomic_write_text_file(path, &content, storage::FILE_MODE).map_err(|err| {
            OpsError::filesystem(format!("Failed to write {}: {}", path.display(), err))
        })?;
        self.logger.info(
            "Successfully generated summary",
            Some(&serde_json::json!({ "path": path, "lines": written })),
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::Deduplicator;
    use crate::services::logger::Logger;

    #[test]
    fn unique_keeps_exact_duplicates_once() {
        let dedup = Deduplicator::new(Logger::new("test"), 10);
        let (set, stats) = dedup.unique(["ls -la", "ls -la ", "LS -LA", "ls -la"]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.unique, 3);
        assert!(set.contains("ls -la "));
    }

    #[test]
    fn summary_lines_drop_short_entries_at_byte_boundary() {
        let dedup = Deduplicator::new(Logger::new("test"), 10);
        let (set, _) = dedup.unique(["123456789", "1234567890", "git status --short"]);
        let kept: Vec<&str> = dedup.summary_lines(&set).collect();
        assert_eq!(kept, vec!["1234567890", "git status --short"]);
    }
}
