use std::collections::BTreeMap;

use alphabatch_model::JobId;

/// Fraction and last status line of one ACTIVE job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    pub fraction: f64,
    pub status: String,
}

/// Tracks per-job progress for a run and folds it into one percentage.
///
/// Entries exist only while a job is ACTIVE. Retiring a job removes its
/// entry and counts it as fully done in the overall figure.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    total: usize,
    retired: usize,
    entries: BTreeMap<JobId, ProgressEntry>,
}

impl ProgressAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            retired: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn retired(&self) -> usize {
        self.retired
    }

    pub fn active(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, job_id: JobId) -> Option<&ProgressEntry> {
        self.entries.get(&job_id)
    }

    pub fn track(&mut self, job_id: JobId) {
        self.entries.entry(job_id).or_insert_with(|| ProgressEntry {
            fraction: 0.0,
            status: String::from("submitted"),
        });
    }

    /// Records a progress observation and returns the stored fraction.
    ///
    /// Values are clamped into `[0, 1]` and never move backwards for a job;
    /// a lower reading keeps the previous fraction but updates the status.
    pub fn update(
        &mut self,
        job_id: JobId,
        fraction: f64,
        status: impl Into<String>,
    ) -> f64 {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let entry = self.entries.entry(job_id).or_insert_with(|| ProgressEntry {
            fraction: 0.0,
            status: String::new(),
        });
        entry.fraction = entry.fraction.max(fraction);
        entry.status = status.into();
        entry.fraction
    }

    /// Counts `job_id` as finished. Jobs that were never tracked (skipped,
    /// failed on submit) are counted too.
    pub fn retire(&mut self, job_id: JobId) {
        self.entries.remove(&job_id);
        self.retired = (self.retired + 1).min(self.total);
    }

    /// `100 * retired / total + (100 / total) * mean(active fractions)`.
    pub fn overall(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        let retired_share = 100.0 * self.retired as f64 / total;
        let active_share = if self.entries.is_empty() {
            0.0
        } else {
            let sum: f64 = self.entries.values().map(|e| e.fraction).sum();
            (100.0 / total) * (sum / self.entries.len() as f64)
        };
        (retired_share + active_share).clamp(0.0, 100.0)
    }

    /// Overall progress rounded down to a whole percent.
    pub fn overall_percent(&self) -> u8 {
        self.overall().floor() as u8
    }
}
