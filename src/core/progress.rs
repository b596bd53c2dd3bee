//! Progress reporting back to the caller

/// Receives `(title, fraction)` updates at stage boundaries.
///
/// Any `FnMut(&str, f32)` closure is a reporter.
pub trait ProgressReporter {
    fn report(&mut self, title: &str, fraction: f32);
}

impl<F: FnMut(&str, f32)> ProgressReporter for F {
    fn report(&mut self, title: &str, fraction: f32) {
        self(title, fraction.clamp(0.0, 1.0))
    }
}

/// Reporter that discards all updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _title: &str, _fraction: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_reporter_clamps() {
        let mut seen = Vec::new();
        {
            let mut reporter = |title: &str, f: f32| seen.push((title.to_string(), f));
            reporter.report("a", 1.5);
            reporter.report("b", -1.0);
        }
        assert_eq!(seen, vec![("a".to_string(), 1.0), ("b".to_string(), 0.0)]);
    }
}
