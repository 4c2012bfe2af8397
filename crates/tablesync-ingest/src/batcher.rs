//! Fixed-size batching for insert runs

use crate::record::{Batch, NormalizedRecord};
use tablesync_common::{Result, SyncError};

/// Groups records into batches of at most `size`, in arrival order
#[derive(Debug)]
pub struct Batcher {
    size: usize,
    pending: Vec<NormalizedRecord>,
}

impl Batcher {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SyncError::config("batch size must be at least 1"));
        }
        Ok(Self {
            size,
            pending: Vec::with_capacity(size),
        })
    }

    /// Records waiting for the current batch to fill
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Add a record, returning a full batch once `size` records are pending
    pub fn push(&mut self, record: NormalizedRecord) -> Option<Batch> {
        self.pending.push(record);
        if self.pending.len() >= self.size {
            let full = std::mem::replace(&mut self.pending, Vec::with_capacity(self.size));
            Batch::new(full)
        } else {
            None
        }
    }

    /// Emit the remainder, if any
    pub fn finish(&mut self) -> Option<Batch> {
        Batch::new(std::mem::take(&mut self.pending))
    }
}
