//! Running averages.

/// Accumulates a running mean of reported values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AverageMeter {
    /// The most recently reported value.
    pub val: f32,
    /// Weighted sum of every reported value.
    pub sum: f32,
    /// Total weight reported so far.
    pub count: usize,
    /// `sum / count`, or 0 before the first update.
    pub avg: f32,
}

impl AverageMeter {
    /// An empty meter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one value with weight 1.
    pub fn update(&mut self, val: f32) {
        self.update_n(val, 1);
    }

    /// Record `val` as the average of `n` observations.
    pub fn update_n(&mut self, val: f32, n: usize) {
        self.val = val;
        self.sum += val * n as f32;
        self.count += n;
        if self.count > 0 {
            self.avg = self.sum / self.count as f32;
        }
    }

    /// Forget everything recorded.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
