/// Work scheduled to run after a number of simulation ticks.
///
/// The owner calls [`DeferredTask::tick`] once per tick; it reports `true`
/// exactly once, on the tick the countdown reaches zero. A task created with
/// zero delay fires on the first tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeferredTask {
    remaining: u32,
    fired: bool,
}

impl DeferredTask {
    pub fn after(ticks: u32) -> Self {
        Self {
            remaining: ticks,
            fired: false,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn tick(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.fired = true;
        }
        self.fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_countdown() {
        let mut task = DeferredTask::after(3);
        assert!(!task.tick());
        assert!(!task.tick());
        assert!(task.tick());
        assert!(!task.tick());
        assert!(task.has_fired());
    }

    #[test]
    fn zero_delay_fires_on_first_tick() {
        let mut task = DeferredTask::after(0);
        assert!(task.tick());
    }
}
