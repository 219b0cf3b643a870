//! Cooperative periodic task table for the single control loop.
//!
//! Intervals are supplied by the caller on every due-check rather than stored
//! here, so a settings update takes effect on the next check without a
//! restart. `mark_fired` must be called whenever the work ran, successfully
//! or not; a failed fetch still consumes its interval slot to bound the retry
//! rate.

/// Every independently scheduled activity of the device, in dispatch
/// priority order: local sensing and display work ahead of network refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskId {
    SensorSample,
    ClockRedraw,
    PageRotate,
    WeatherRefresh,
    PollenRefresh,
}

impl TaskId {
    pub const ALL: [TaskId; 5] = [
        TaskId::SensorSample,
        TaskId::ClockRedraw,
        TaskId::PageRotate,
        TaskId::WeatherRefresh,
        TaskId::PollenRefresh,
    ];

    /// Remote-data tasks only run while the link is in operating state.
    pub fn requires_connectivity(self) -> bool {
        matches!(self, TaskId::WeatherRefresh | TaskId::PollenRefresh)
    }
}

#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    id: TaskId,
    last_fired_ms: Option<u64>,
    forced: bool,
}

/// Fixed-size table of periodic tasks, one entry per [`TaskId`].
#[derive(Debug, Clone)]
pub struct TaskTable {
    tasks: [PeriodicTask; TaskId::ALL.len()],
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTable {
    pub fn new() -> Self {
        Self {
            tasks: TaskId::ALL.map(|id| PeriodicTask {
                id,
                last_fired_ms: None,
                forced: false,
            }),
        }
    }

    /// A task is due when forced, never fired, or its interval has elapsed.
    pub fn is_due(&self, id: TaskId, now_ms: u64, interval_ms: u64) -> bool {
        let task = self.task(id);
        task.forced
            || task
                .last_fired_ms
                .map(|last| now_ms.saturating_sub(last) >= interval_ms)
                .unwrap_or(true)
    }

    /// Record that the task's work ran at `now_ms`, whether or not it
    /// succeeded, and clear any force flag.
    pub fn mark_fired(&mut self, id: TaskId, now_ms: u64) {
        let task = self.task_mut(id);
        task.last_fired_ms = Some(now_ms);
        task.forced = false;
    }

    /// Make the task due on its next check regardless of interval.
    pub fn force(&mut self, id: TaskId) {
        self.task_mut(id).forced = true;
    }

    /// Force every remote-data task, used once per connectivity acquisition.
    pub fn force_remote(&mut self) {
        for id in TaskId::ALL {
            if id.requires_connectivity() {
                self.force(id);
            }
        }
    }

    pub fn last_fired_ms(&self, id: TaskId) -> Option<u64> {
        self.task(id).last_fired_ms
    }

    fn task(&self, id: TaskId) -> &PeriodicTask {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .unwrap_or(&self.tasks[0])
    }

    fn task_mut(&mut self, id: TaskId) -> &mut PeriodicTask {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .unwrap_or(0);
        &mut self.tasks[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_fired_task_is_due_immediately() {
        let table = TaskTable::new();
        assert!(table.is_due(TaskId::SensorSample, 0, 30_000));
    }

    #[test]
    fn fired_task_waits_out_its_interval() {
        let mut table = TaskTable::new();
        table.mark_fired(TaskId::WeatherRefresh, 1_000);

        assert!(!table.is_due(TaskId::WeatherRefresh, 1_001, 60_000));
        assert!(!table.is_due(TaskId::WeatherRefresh, 60_999, 60_000));
        assert!(table.is_due(TaskId::WeatherRefresh, 61_000, 60_000));
    }

    #[test]
    fn failed_work_still_consumes_the_slot() {
        let mut table = TaskTable::new();
        // The fetch failed, but the caller marks the fire time anyway.
        table.mark_fired(TaskId::PollenRefresh, 5_000);

        assert_eq!(table.last_fired_ms(TaskId::PollenRefresh), Some(5_000));
        assert!(!table.is_due(TaskId::PollenRefresh, 5_001, 10_000));
    }

    #[test]
    fn force_overrides_interval_once() {
        let mut table = TaskTable::new();
        table.mark_fired(TaskId::WeatherRefresh, 1_000);
        table.force(TaskId::WeatherRefresh);

        assert!(table.is_due(TaskId::WeatherRefresh, 1_001, 60_000));
        table.mark_fired(TaskId::WeatherRefresh, 1_001);
        assert!(!table.is_due(TaskId::WeatherRefresh, 1_002, 60_000));
    }

    #[test]
    fn force_remote_touches_only_network_tasks() {
        let mut table = TaskTable::new();
        for id in TaskId::ALL {
            table.mark_fired(id, 1_000);
        }
        table.force_remote();

        assert!(table.is_due(TaskId::WeatherRefresh, 1_001, 60_000));
        assert!(table.is_due(TaskId::PollenRefresh, 1_001, 60_000));
        assert!(!table.is_due(TaskId::SensorSample, 1_001, 60_000));
        assert!(!table.is_due(TaskId::ClockRedraw, 1_001, 60_000));
    }

    #[test]
    fn interval_change_applies_on_next_check() {
        let mut table = TaskTable::new();
        table.mark_fired(TaskId::WeatherRefresh, 0);

        // 15 min interval: not due yet at 10 min.
        assert!(!table.is_due(TaskId::WeatherRefresh, 600_000, 900_000));
        // Settings dropped the interval to 5 min; same check time is now due.
        assert!(table.is_due(TaskId::WeatherRefresh, 600_000, 300_000));
    }
}
