//! Batch processing of component documents
//!
//! Reading and validating a component is CPU-bound and synchronous, so a
//! batch runs on a dedicated rayon pool. Each document gets its own report;
//! one bad document never stops the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::Ddms;
use crate::error::{DdmsError, Result};
use crate::render::OutputFormat;
use crate::validator::ValidationMessage;

/// Outcome of processing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DocumentStatus {
    /// A component was constructed without warnings
    Valid,
    /// A component was constructed, with warnings
    Warned { warning_count: usize },
    /// The document data violates a constraint
    Invalid { failure: ValidationMessage },
    /// Unreadable, unparseable or unrecognized input
    Error { message: String },
}

impl DocumentStatus {
    /// True if a component was constructed
    pub fn is_accepted(&self) -> bool {
        matches!(self, DocumentStatus::Valid | DocumentStatus::Warned { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, DocumentStatus::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DocumentStatus::Error { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub status: DocumentStatus,
    /// Qualified name of the root component
    pub component: Option<String>,
    pub version: Option<String>,
    pub rendered: Option<String>,
    pub warnings: Vec<ValidationMessage>,
    pub duration: Duration,
}

impl DocumentReport {
    fn failed(path: PathBuf, error: DdmsError, duration: Duration) -> Self {
        let status = match error {
            DdmsError::Validation(failure) => DocumentStatus::Invalid {
                failure: ValidationMessage {
                    locator: failure.locator().to_string(),
                    ..ValidationMessage::error(failure.message())
                },
            },
            other => DocumentStatus::Error {
                message: other.to_string(),
            },
        };
        Self {
            path,
            status,
            component: None,
            version: None,
            rendered: None,
            warnings: Vec::new(),
            duration,
        }
    }
}

/// Aggregated results of a batch
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResults {
    pub started_at: DateTime<Utc>,
    pub total_files: usize,
    pub valid_files: usize,
    pub warned_files: usize,
    pub invalid_files: usize,
    pub error_files: usize,
    /// Wall-clock duration of the batch
    pub total_duration: Duration,
    pub reports: Vec<DocumentReport>,
}

impl ProcessingResults {
    pub fn aggregate(
        reports: Vec<DocumentReport>,
        started_at: DateTime<Utc>,
        total_duration: Duration,
    ) -> Self {
        let mut results = Self {
            started_at,
            total_files: reports.len(),
            valid_files: 0,
            warned_files: 0,
            invalid_files: 0,
            error_files: 0,
            total_duration,
            reports: Vec::new(),
        };
        for report in &reports {
            match report.status {
                DocumentStatus::Valid => results.valid_files += 1,
                DocumentStatus::Warned { .. } => results.warned_files += 1,
                DocumentStatus::Invalid { .. } => results.invalid_files += 1,
                DocumentStatus::Error { .. } => results.error_files += 1,
            }
        }
        results.reports = reports;
        results
    }

    pub fn has_errors(&self) -> bool {
        self.invalid_files > 0 || self.error_files > 0
    }

    /// Percentage of documents that produced a component
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            ((self.valid_files + self.warned_files) as f64 / self.total_files as f64) * 100.0
        }
    }
}

pub struct DocumentProcessor {
    engine: Arc<Ddms>,
    format: OutputFormat,
    threads: usize,
}

impl DocumentProcessor {
    pub fn new(engine: Arc<Ddms>, format: OutputFormat) -> Self {
        Self {
            engine,
            format,
            threads: num_cpus::get(),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn engine(&self) -> &Ddms {
        &self.engine
    }

    /// Reads, validates and renders one in-memory document
    pub fn process_source(&self, path: &Path, xml: &str) -> DocumentReport {
        let start = Instant::now();
        match self.engine.read_any(xml) {
            Ok(component) => {
                let warnings = component.warnings().to_vec();
                let status = if warnings.is_empty() {
                    DocumentStatus::Valid
                } else {
                    DocumentStatus::Warned {
                        warning_count: warnings.len(),
                    }
                };
                let rendered = self.engine.renderer().render(&component, self.format);
                DocumentReport {
                    path: path.to_path_buf(),
                    status,
                    component: Some(component.qualified_name()),
                    version: Some(component.version().token().to_string()),
                    rendered: Some(rendered),
                    warnings,
                    duration: start.elapsed(),
                }
            }
            Err(e) => DocumentReport::failed(path.to_path_buf(), e, start.elapsed()),
        }
    }

    pub fn process_file(&self, path: &Path) -> DocumentReport {
        let start = Instant::now();
        match std::fs::read_to_string(path) {
            Ok(xml) => {
                let report = self.process_source(path, &xml);
                debug!(path = %path.display(), status = ?report.status, "Processed document");
                report
            }
            Err(source) => DocumentReport::failed(
                path.to_path_buf(),
                DdmsError::Io {
                    path: path.to_path_buf(),
                    source,
                },
                start.elapsed(),
            ),
        }
    }

    /// Processes every file on the pool. Reports keep the order of `paths`.
    pub fn process_files(&self, paths: &[PathBuf]) -> Result<ProcessingResults> {
        let started_at = Utc::now();
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        let reports: Vec<DocumentReport> =
            pool.install(|| paths.par_iter().map(|path| self.process_file(path)).collect());

        let results = ProcessingResults::aggregate(reports, started_at, start.elapsed());
        info!(
            files = results.total_files,
            invalid = results.invalid_files,
            errors = results.error_files,
            threads = self.threads,
            "Batch processed"
        );
        Ok(results)
    }
}
