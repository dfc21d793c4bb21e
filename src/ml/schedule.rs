// ============================================================
// Layer 5 — Learning Rate Controller
// ============================================================
// Plateau-style decay driven by validation loss:
//
//   lr ← lr · decay   whenever val_loss(epoch) > val_loss(epoch − 1)
//
// The comparison is always against the immediately previous
// epoch, never against the best epoch. The first observed loss
// only establishes the reference (the trainer feeds it the
// validation loss measured before the first training epoch).
//
// A NaN on either side compares false and never decays.

#[derive(Debug, Clone, PartialEq)]
pub struct LearningRateController {
    lr:       f64,
    decay:    f64,
    previous: Option<f64>,
}

impl LearningRateController {
    pub fn new(lr: f64, decay: f64) -> Self {
        Self { lr, decay, previous: None }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// Record a validation loss. Returns true when the rate was decayed.
    pub fn observe(&mut self, val_loss: f64) -> bool {
        let decayed = matches!(self.previous, Some(prev) if val_loss > prev);
        if decayed {
            self.lr *= self.decay;
        }
        self.previous = Some(val_loss);
        decayed
    }

    /// Multiply the current rate, e.g. when resuming with a new factor.
    pub fn rescale(&mut self, factor: f64) {
        self.lr *= factor;
    }

    /// Restore the state saved with a checkpoint.
    pub fn restore(&mut self, lr: f64, previous: Option<f64>) {
        self.lr = lr;
        self.previous = previous;
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decays_only_when_loss_rises() {
        let mut ctl = LearningRateController::new(1.0, 0.5);
        let decays: Vec<bool> = [0.9, 0.7, 0.8, 0.75].iter().map(|&l| ctl.observe(l)).collect();
        assert_eq!(decays, vec![false, false, true, false]);
        assert_eq!(ctl.lr(), 0.5);
        assert_eq!(ctl.previous(), Some(0.75));
    }

    #[test]
    fn test_compares_with_previous_not_best() {
        let mut ctl = LearningRateController::new(1.0, 0.5);
        ctl.observe(0.5);
        ctl.observe(0.9); // rise → decay
        ctl.observe(0.8); // below previous, above best → no decay
        assert_eq!(ctl.lr(), 0.5);
    }

    #[test]
    fn test_nan_never_decays() {
        let mut ctl = LearningRateController::new(1.0, 0.5);
        ctl.observe(f64::NAN);
        assert!(!ctl.observe(1.0));
        assert!(!ctl.observe(f64::NAN));
        assert_eq!(ctl.lr(), 1.0);
    }

    #[test]
    fn test_rescale_and_restore() {
        let mut ctl = LearningRateController::new(0.01, 0.5);
        ctl.restore(0.004, Some(1.5));
        ctl.rescale(0.5);
        assert!((ctl.lr() - 0.002).abs() < 1e-12);
        assert!(ctl.observe(1.6));
    }
}
