use virta_domain::SensorRow;

/// Accumulates rows into bounded-size chunks for bulk writes.
///
/// Each emitted chunk is sorted by timestamp so the sink sees monotonic
/// write order within a flush. The ceiling bounds memory and per-statement
/// size; a single oversized push still flushes as one chunk.
#[derive(Debug)]
pub struct RowBatcher {
    limit: usize,
    buffer: Vec<SensorRow>,
}

impl RowBatcher {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            buffer: Vec::new(),
        }
    }

    /// Add rows; returns a full, sorted chunk once the ceiling is reached.
    pub fn push(&mut self, rows: Vec<SensorRow>) -> Option<Vec<SensorRow>> {
        self.buffer.extend(rows);
        if self.buffer.len() >= self.limit {
            Some(self.drain())
        } else {
            None
        }
    }

    /// Flush whatever remains, sorted; `None` when the buffer is empty.
    pub fn finish(&mut self) -> Option<Vec<SensorRow>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.drain())
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn drain(&mut self) -> Vec<SensorRow> {
        let mut chunk = std::mem::take(&mut self.buffer);
        chunk.sort_by_key(|row| row.timestamp);
        chunk
    }
}
