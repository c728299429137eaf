/// Aggregated view of round progress, useful for UI.
///
/// `done`/`total` is `mastered/batch_len` in learn mode and
/// `position + 1/pass_len` in review mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundProgress {
    pub pass_number: u32,
    pub position: usize,
    pub pass_len: usize,
    pub answered_in_pass: usize,
    pub done: usize,
    pub total: usize,
    pub can_retreat: bool,
    pub can_advance: bool,
    pub is_complete: bool,
}

impl RoundProgress {
    /// Share of `done` over `total` in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.done.min(self.total) as f64 / self.total as f64
        }
    }
}
