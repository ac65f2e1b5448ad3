/// Deadline timer driven by an externally supplied millisecond clock.
///
/// The driver owns the clock and feeds observed timestamps through
/// `update`; the timer itself never reads wall time. Time only moves
/// forward: a stale `update` is clamped to the latest observation.
#[derive(Clone, Debug)]
pub struct QuorumTimer {
    current_time_ms: i64,
    deadline_ms: i64,
}

impl QuorumTimer {
    pub fn new(
        start_ms: i64,
        timeout_ms: u64,
    ) -> Self {
        Self {
            current_time_ms: start_ms,
            deadline_ms: start_ms.saturating_add(timeout_ms as i64),
        }
    }

    /// Advance the timer's view of the clock.
    pub fn update(
        &mut self,
        now_ms: i64,
    ) {
        self.current_time_ms = self.current_time_ms.max(now_ms);
    }

    /// Re-arm the timer `timeout_ms` past the last observed time.
    pub fn reset(
        &mut self,
        timeout_ms: u64,
    ) {
        self.deadline_ms = self.current_time_ms.saturating_add(timeout_ms as i64);
    }

    pub fn remaining_ms(&self) -> u64 {
        self.deadline_ms.saturating_sub(self.current_time_ms).max(0) as u64
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ms() == 0
    }
}
