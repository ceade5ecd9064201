use crate::errors::OpsError;
use crate::services::logger::Logger;
use crate::utils::text::split_lines;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// All lines of every file under a directory, in walk order.
#[derive(Debug, Default, Clone)]
pub struct Aggregate {
    pub line_counts: BTreeMap<PathBuf, usize>,
    pub lines: Vec<String>,
}

impl Aggregate {
    pub fn file_count(&self) -> usize {
        self.line_counts.len()
    }

    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }
}

#[derive(Debug, Clone)]
pub struct LineAggregator {
    logger: Logger,
    excluded: Vec<String>,
}

impl LineAggregator {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("aggregate"),
            excluded: Vec::new(),
        }
    }

    /// Skips files with this exact name wherever they appear in the tree.
    pub fn exclude(mut self, file_name: impl Into<String>) -> Self {
        self.excluded.push(file_name.into());
        self
    }

    /// Reads every regular file below `dir`. The first unreadable entry fails
    /// the whole walk.
    pub fn aggregate(&self, dir: &Path) -> Result<Aggregate, OpsError> {
        let mut aggregate = Aggregate::default();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if self.excluded.iter().any(|skip| *skip == name) {
                continue;
            }
            let raw = std::fs::read(entry.path()).map_err(|err| {
                OpsError::filesystem(format!(
                    "Failed to read {}: {}",
                    entry.path().display(),
                    err
                ))
            })?;
            let lines = split_lines(&raw);
            aggregate
                .line_counts
                .insert(entry.path().to_path_buf(), lines.len());
            aggregate.lines.extend(lines);
        }
        self.logger.debug(
            "Aggregated directory",
            Some(&serde_json::json!({
                "dir": dir,
                "files": aggregate.file_count(),
                "lines": aggregate.total_lines(),
            })),
        );
        Ok(aggregate)
    }
}
