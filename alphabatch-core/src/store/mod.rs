//! Result persistence.
//!
//! [`ResultTable`] holds the ordering and dedup rules; [`ResultStore`] binds
//! a table to a CSV file and serializes every read-modify-write cycle.

mod csv_file;
mod table;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use alphabatch_model::{AlphaId, ResultRecord};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{BatchError, Result};

pub use csv_file::{HEADER, read_table, write_table};
pub use table::ResultTable;

/// File-backed result table shared by runs and submission workflows.
///
/// Cloning is cheap; clones share the same write lock.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<ResultTable> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        blocking(move || read_table(&path)).await
    }

    /// Reads the whole table, applies `mutate` and rewrites the file while
    /// holding the store lock.
    async fn modify<T, F>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut ResultTable) -> T + Send + 'static,
        T: Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        blocking(move || {
            let mut table = read_table(&path)?;
            let out = mutate(&mut table);
            write_table(&path, &table)?;
            Ok(out)
        })
        .await
    }

    /// Persists `record`, replacing an earlier row with the same
    /// `(alpha_id, formula)`.
    pub async fn persist(&self, record: ResultRecord) -> Result<()> {
        let alpha_id = record.alpha_id.clone();
        let replaced = self.modify(move |table| table.upsert(record)).await?;
        info!(
            target: "alphabatch::store",
            alpha_id = %alpha_id,
            replaced,
            path = %self.path.display(),
            "result persisted"
        );
        Ok(())
    }

    /// Marks every row of `alpha_id` as submitted and reorders the file.
    /// Returns `false` when no row matched.
    pub async fn mark_submitted(&self, alpha_id: &AlphaId) -> Result<bool> {
        let target = alpha_id.clone();
        let marked = self
            .modify(move |table| table.mark_submitted(&target))
            .await?;
        debug!(
            target: "alphabatch::store",
            alpha_id = %alpha_id,
            marked,
            "marked submitted"
        );
        Ok(marked > 0)
    }

    pub async fn unsubmitted(&self) -> Result<Vec<ResultRecord>> {
        let table = self.load().await?;
        Ok(table.unsubmitted().cloned().collect())
    }
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| BatchError::Internal(format!("store task failed: {err}")))?
}
