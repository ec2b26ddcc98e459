use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::scheduler_traits::{RetryScheduler, TimerId};

/// A timer armed on a [`ManualScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTimer {
    pub id: TimerId,
    pub portfolio_uuid: String,
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct ManualState {
    next_id: u64,
    armed: Vec<ScheduledTimer>,
    scheduled_total: usize,
}

/// Scheduler that never fires on its own.
///
/// Tests pop armed timers with [`ManualScheduler::take_armed`] and feed them
/// back into the context, which makes retry sequences deterministic.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timers currently armed, oldest first.
    pub fn armed(&self) -> Vec<ScheduledTimer> {
        self.state.lock().unwrap().armed.clone()
    }

    /// Removes and returns every armed timer, as if they had all fired.
    pub fn take_armed(&self) -> Vec<ScheduledTimer> {
        std::mem::take(&mut self.state.lock().unwrap().armed)
    }

    /// Total number of timers ever scheduled.
    pub fn scheduled_total(&self) -> usize {
        self.state.lock().unwrap().scheduled_total
    }
}

impl RetryScheduler for ManualScheduler {
    fn schedule(&self, portfolio_uuid: &str, delay: Duration) -> TimerId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.armed.push(ScheduledTimer {
            id,
            portfolio_uuid: portfolio_uuid.to_string(),
            delay,
        });
        state.scheduled_total += 1;
        id
    }

    fn cancel(&self, timer: TimerId) {
        self.state
            .lock()
            .unwrap()
            .armed
            .retain(|scheduled| scheduled.id != timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_and_cancel() {
        let scheduler = ManualScheduler::new();
        let first = scheduler.schedule("p", Duration::from_millis(10));
        let second = scheduler.schedule("q", Duration::from_millis(10));
        assert_ne!(first, second);
        assert_eq!(scheduler.armed().len(), 2);

        scheduler.cancel(first);
        let armed = scheduler.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(armed[0].portfolio_uuid, "q");

        assert_eq!(scheduler.take_armed().len(), 1);
        assert!(scheduler.armed().is_empty());
        assert_eq!(scheduler.scheduled_total(), 2);
    }
}
