use std::collections::VecDeque;

use tracing::trace;

use crate::BatchError;
use crate::ControlRecord;
use crate::Result;

/// A batch handed to the log layer for encoding and replication.
#[derive(Debug, PartialEq, Eq)]
pub enum CompletedBatch<T> {
    Data {
        base_offset: u64,
        records: Vec<T>,
    },
    Control {
        base_offset: u64,
        append_time_ms: i64,
        records: Vec<ControlRecord>,
    },
}

impl<T> CompletedBatch<T> {
    pub fn base_offset(&self) -> u64 {
        match self {
            CompletedBatch::Data { base_offset, .. } => *base_offset,
            CompletedBatch::Control { base_offset, .. } => *base_offset,
        }
    }

    pub fn record_count(&self) -> usize {
        match self {
            CompletedBatch::Data { records, .. } => records.len(),
            CompletedBatch::Control { records, .. } => records.len(),
        }
    }
}

/// Builder passed to the control-batch append callback.
pub struct ControlBatchBuilder {
    base_offset: u64,
    epoch: u64,
    append_time_ms: i64,
    records: Vec<ControlRecord>,
}

impl ControlBatchBuilder {
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn append(
        &mut self,
        record: ControlRecord,
    ) {
        self.records.push(record);
    }
}

/// Accumulates leader appends into batches, generic over the log record type.
///
/// Data records buffer until the batch fills, the linger expires, or a drain
/// is forced. Control records bypass the buffer entirely: each control
/// append completes immediately as its own batch so it is never interleaved
/// with client data.
pub struct BatchAccumulator<T> {
    epoch: u64,
    next_offset: u64,
    max_batch_records: usize,
    linger_ms: u64,
    buffer: Vec<T>,
    buffered_since_ms: i64,
    completed: VecDeque<CompletedBatch<T>>,
    force_drain: bool,
    closed: bool,
}

impl<T> BatchAccumulator<T> {
    pub fn new(
        epoch: u64,
        base_offset: u64,
        max_batch_records: usize,
        linger_ms: u64,
    ) -> Self {
        Self {
            epoch,
            next_offset: base_offset,
            max_batch_records,
            linger_ms,
            buffer: Vec::new(),
            buffered_since_ms: -1,
            completed: VecDeque::new(),
            force_drain: false,
            closed: false,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Offset the next appended record will occupy.
    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    /// Append data records to the current batch.
    ///
    /// Returns the offset of the last appended record.
    pub fn append(
        &mut self,
        now_ms: i64,
        records: Vec<T>,
    ) -> Result<u64> {
        self.ensure_open()?;
        if self.buffer.is_empty() {
            self.buffered_since_ms = now_ms;
        }
        self.next_offset += records.len() as u64;
        self.buffer.extend(records);
        trace!(
            "accumulator append, buffered={}, next_offset={}",
            self.buffer.len(),
            self.next_offset
        );
        if self.buffer.len() >= self.max_batch_records {
            self.complete_data_batch();
        }
        Ok(self.next_offset.saturating_sub(1))
    }

    /// Append a batch of control records built by `build`.
    ///
    /// The pending data batch, if any, is completed first so the control
    /// records land at a batch boundary. Returns the base offset of the
    /// control batch.
    pub fn append_control_batch<F>(
        &mut self,
        now_ms: i64,
        build: F,
    ) -> Result<u64>
    where
        F: FnOnce(&mut ControlBatchBuilder) -> Result<()>,
    {
        self.ensure_open()?;
        self.complete_data_batch();

        let mut builder = ControlBatchBuilder {
            base_offset: self.next_offset,
            epoch: self.epoch,
            append_time_ms: now_ms,
            records: Vec::new(),
        };
        build(&mut builder)?;

        let base_offset = builder.base_offset;
        self.next_offset += builder.records.len() as u64;
        self.completed.push_back(CompletedBatch::Control {
            base_offset,
            append_time_ms: builder.append_time_ms,
            records: builder.records,
        });
        Ok(base_offset)
    }

    /// Mark everything buffered as drainable immediately.
    pub fn force_drain(&mut self) {
        self.force_drain = true;
    }

    /// Whether `drain` would currently return at least one batch.
    pub fn needs_drain(
        &self,
        now_ms: i64,
    ) -> bool {
        !self.completed.is_empty() || self.force_drain || self.linger_expired(now_ms)
    }

    /// Time until the linger deadline makes the buffered batch drainable.
    pub fn time_until_drain_ms(
        &self,
        now_ms: i64,
    ) -> u64 {
        if !self.completed.is_empty() || self.force_drain {
            return 0;
        }
        if self.buffer.is_empty() {
            return u64::MAX;
        }
        let deadline = self.buffered_since_ms.saturating_add(self.linger_ms as i64);
        deadline.saturating_sub(now_ms).max(0) as u64
    }

    /// Take all drainable batches, completing the buffered batch when the
    /// linger has expired or a drain was forced.
    pub fn drain(
        &mut self,
        now_ms: i64,
    ) -> Vec<CompletedBatch<T>> {
        if self.force_drain || self.linger_expired(now_ms) {
            self.complete_data_batch();
            self.force_drain = false;
        }
        self.completed.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.completed.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Completes the buffered batch and refuses further appends. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.complete_data_batch();
        self.closed = true;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BatchError::AccumulatorClosed.into());
        }
        Ok(())
    }

    fn linger_expired(
        &self,
        now_ms: i64,
    ) -> bool {
        !self.buffer.is_empty()
            && now_ms >= self.buffered_since_ms.saturating_add(self.linger_ms as i64)
    }

    fn complete_data_batch(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let records = std::mem::take(&mut self.buffer);
        let base_offset = self.next_offset - records.len() as u64;
        self.buffered_since_ms = -1;
        self.completed.push_back(CompletedBatch::Data {
            base_offset,
            records,
        });
    }
}
