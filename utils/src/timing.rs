// Helpers to handle budgeting subsystems based on time
//
// Austin Shafer - 2023
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Error getting system time")
}

/// Get the current time in milliseconds
///
/// This is the timestamp format handed out by frame callbacks, the
/// classic `tv_sec * 1000 + tv_usec / 1000`. All other timestamped
/// events posted by the compositor share this origin.
pub fn get_current_millis() -> u32 {
    get_current_time().as_millis() as u32
}

// Manages subsystem timings
//
// The motivation for this is frame callbacks, which need to take
// place roughly once every 16 ms (once a frame at 60 fps). This
// struct keeps track of how much time is remaining before an action
// needs to be taken, and callers can use that number for their
// timeout values.
//
// This isn't a timing subsystem, but rather a helper for tracking
// timing information.
pub struct TimingManager {
    // length of time we are counting down from
    tm_period: Duration,
    // the last time we reset this manager
    tm_start: Duration,
}

impl TimingManager {
    // create a new manager to track time
    // periods of length `period` ms
    pub fn new(period: u32) -> TimingManager {
        TimingManager {
            tm_period: Duration::from_millis(period as u64),
            tm_start: get_current_time(),
        }
    }

    // Reset the manager to the current time
    pub fn reset(&mut self) {
        self.tm_start = get_current_time();
    }

    // Returns true if period ms have passed
    // since this manager was reset
    pub fn is_overdue(&mut self) -> bool {
        let time = get_current_time();

        if time - self.tm_start >= self.tm_period {
            return true;
        }
        return false;
    }

    // Returns the number of ms remaining in this tracker
    //
    // If 0 is returned, it is overdue and we should reset it.
    pub fn time_remaining(&mut self) -> usize {
        let time_elapsed = get_current_time() - self.tm_start;
        if self.is_overdue() {
            return 0;
        }
        return (self.tm_period - time_elapsed).as_millis() as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_millis_is_nonzero() {
        assert!(get_current_millis() > 0);
    }

    #[test]
    fn fresh_manager_is_not_overdue() {
        let mut tm = TimingManager::new(10_000);
        assert!(!tm.is_overdue());
        assert!(tm.time_remaining() > 0);
    }

    #[test]
    fn zero_period_is_immediately_overdue() {
        let mut tm = TimingManager::new(0);
        assert!(tm.is_overdue());
        assert_eq!(tm.time_remaining(), 0);
    }
}
