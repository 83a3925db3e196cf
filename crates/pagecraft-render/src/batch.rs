//! Batch export: one rendered artifact per data record.

use std::fs;
use std::path::{Path, PathBuf};

use pagecraft_core::batch::{BatchJob, BatchRecord, PlaceholderPolicy, apply_record};
use pagecraft_core::export::ExportSpec;
use pagecraft_core::scene::SceneGraph;

use crate::error::{RenderError, RenderResult};
use crate::export::{Artifact, CancelToken, Exporter};

/// How a batch job is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Keep going after a record fails, reporting the failure in the archive.
    /// When off, the first failure aborts the job.
    pub isolate_failures: bool,
    /// Render records on the rayon pool. Needs the `parallel` feature;
    /// without it records are rendered in order on the calling thread.
    pub parallel: bool,
    pub policy: PlaceholderPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            isolate_failures: true,
            parallel: false,
            policy: PlaceholderPolicy::Passthrough,
        }
    }
}

/// One rendered record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position of the record in the job.
    pub index: usize,
    pub artifact: Artifact,
}

/// A record that could not be rendered.
#[derive(Debug)]
pub struct RecordFailure {
    pub index: usize,
    pub record: String,
    pub error: RenderError,
}

/// Named collection of same-format artifacts, in record order.
#[derive(Debug, Default)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
    failures: Vec<RecordFailure>,
}

impl Archive {
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn failures(&self) -> &[RecordFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every record rendered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Look up an artifact by file name.
    pub fn get(&self, file_name: &str) -> Option<&Artifact> {
        self.entries
            .iter()
            .map(|e| &e.artifact)
            .find(|a| a.file_name() == file_name)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.artifact.file_name()).collect()
    }

    /// Add an artifact under a file-system safe name; a name already in the
    /// archive gets a `-2`, `-3`, ... suffix.
    fn push(&mut self, index: usize, mut artifact: Artifact) {
        let base = sanitize_file_name(&artifact.name);
        artifact.name.clone_from(&base);
        let mut n = 1;
        while self.entries.iter().any(|e| e.artifact.name == artifact.name) {
            n += 1;
            artifact.name = format!("{base}-{n}");
        }
        self.entries.push(ArchiveEntry { index, artifact });
    }

    /// Write every artifact into `dir`, returning the written paths.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let path = dir.join(entry.artifact.file_name());
            fs::write(&path, &entry.artifact.bytes)?;
            written.push(path);
        }
        Ok(written)
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

/// Runs batch jobs through an [`Exporter`].
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    exporter: Exporter,
    options: BatchOptions,
    cancel: CancelToken,
}

impl BatchRunner {
    pub fn new(exporter: Exporter) -> Self {
        Self {
            exporter,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Builder: observe `cancel` between and during records.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> BatchOptions {
        self.options
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Render every record of `job`.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the token fired, with no partial archive. Without
    /// failure isolation, the first failing record as `BatchRecord`.
    pub fn run(&self, job: &BatchJob) -> RenderResult<Archive> {
        job.spec.validate()?;
        log::info!(
            "Rendering batch of {} records as {}",
            job.records.len(),
            job.spec.format
        );

        let results = self.render_all(job);
        self.cancel.check()?;

        let mut archive = Archive::default();
        for (index, (record, result)) in job.records.iter().zip(results).enumerate() {
            match result {
                Ok(artifact) => archive.push(index, artifact),
                Err(RenderError::Cancelled) => return Err(RenderError::Cancelled),
                Err(error) if !self.options.isolate_failures => {
                    return Err(RenderError::for_record(record.id.clone(), error));
                }
                Err(error) => {
                    log::warn!("Batch record {} failed: {error}", record.id);
                    archive.failures.push(RecordFailure {
                        index,
                        record: record.id.clone(),
                        error,
                    });
                }
            }
        }

        log::info!(
            "Batch finished: {} rendered, {} failed",
            archive.len(),
            archive.failures.len()
        );
        Ok(archive)
    }

    /// Render one record against the template.
    pub fn render_record(
        &self,
        template: &SceneGraph,
        record: &BatchRecord,
        spec: &ExportSpec,
    ) -> RenderResult<Artifact> {
        self.cancel.check()?;
        let page = apply_record(template, record, self.options.policy)?;
        let bytes = self.exporter.render_with_cancel(&page, spec, &self.cancel)?;
        log::debug!("Rendered record {}", record.id);
        Ok(Artifact {
            name: record.id.clone(),
            format: spec.format,
            bytes,
        })
    }

    #[cfg(feature = "parallel")]
    fn render_all(&self, job: &BatchJob) -> Vec<RenderResult<Artifact>> {
        use rayon::prelude::*;

        if self.options.parallel {
            return job
                .records
                .par_iter()
                .map(|record| self.render_record(&job.template, record, &job.spec))
                .collect();
        }
        self.render_sequential(job)
    }

    #[cfg(not(feature = "parallel"))]
    fn render_all(&self, job: &BatchJob) -> Vec<RenderResult<Artifact>> {
        self.render_sequential(job)
    }

    /// In record order; stops after the first failure unless failures are
    /// isolated.
    fn render_sequential(&self, job: &BatchJob) -> Vec<RenderResult<Artifact>> {
        let mut results = Vec::with_capacity(job.records.len());
        for record in &job.records {
            let result = self.render_record(&job.template, record, &job.spec);
            let stop = result.is_err() && !self.options.isolate_failures;
            results.push(result);
            if stop {
                break;
            }
        }
        results
    }
}

/// Render `records` into `template` with default options.
pub fn run_batch(
    template: &SceneGraph,
    records: &[BatchRecord],
    spec: &ExportSpec,
) -> RenderResult<Archive> {
    let job = BatchJob::new(template.clone(), records.to_vec(), spec.clone());
    BatchRunner::default().run(&job)
}
