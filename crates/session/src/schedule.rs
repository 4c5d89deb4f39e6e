//! Periodic report trigger

/// Counts classified frames and fires on every Nth one
#[derive(Debug, Clone)]
pub struct ReportSchedule {
    interval: u64,
    counted: u64,
}

impl ReportSchedule {
    /// An interval of 0 never fires
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            counted: 0,
        }
    }

    /// Count one frame; returns true when a render is due
    pub fn record(&mut self) -> bool {
        self.counted += 1;
        self.interval > 0 && self.counted % self.interval == 0
    }

    pub fn counted(&self) -> u64 {
        self.counted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_every_nth() {
        let mut schedule = ReportSchedule::new(3);
        let fired: Vec<bool> = (0..7).map(|_| schedule.record()).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
        assert_eq!(schedule.counted(), 7);
    }

    #[test]
    fn test_interval_one_fires_always() {
        let mut schedule = ReportSchedule::new(1);
        assert!((0..5).all(|_| schedule.record()));
    }

    #[test]
    fn test_zero_interval_disabled() {
        let mut schedule = ReportSchedule::new(0);
        assert!((0..100).all(|_| !schedule.record()));
    }
}
