use enum_map::EnumMap;

use super::EventKind;
use crate::statistics::Statistic;
use crate::statistics::StatisticLogger;

/// Counters kept by every attached user propagator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStatistics {
    /// The number of events of each kind which reached the router, whether or not the handler
    /// implements them.
    pub events: EnumMap<EventKind, u64>,
    pub consequences_accepted: u64,
    pub consequences_rejected: u64,
    pub overrides_accepted: u64,
    pub overrides_rejected: u64,
    pub bindings_blocked: u64,
}

impl DispatchStatistics {
    pub(crate) fn record(&mut self, event: EventKind) {
        self.events[event] += 1;
    }
}

impl Statistic for DispatchStatistics {
    fn log(&self, statistic_logger: StatisticLogger) {
        for (event, count) in &self.events {
            statistic_logger
                .attach_to_prefix(format!("{}_events", event.name()))
                .log_statistic(count);
        }
        statistic_logger
            .attach_to_prefix("consequences_accepted")
            .log_statistic(self.consequences_accepted);
        statistic_logger
            .attach_to_prefix("consequences_rejected")
            .log_statistic(self.consequences_rejected);
        statistic_logger
            .attach_to_prefix("overrides_accepted")
            .log_statistic(self.overrides_accepted);
        statistic_logger
            .attach_to_prefix("overrides_rejected")
            .log_statistic(self.overrides_rejected);
        statistic_logger
            .attach_to_prefix("bindings_blocked")
            .log_statistic(self.bindings_blocked);
    }
}

#[cfg(test)]
mod tests {
    use super::DispatchStatistics;
    use crate::propagation::EventKind;

    #[test]
    fn a_snapshot_is_unaffected_by_later_events() {
        let mut statistics = DispatchStatistics::default();
        statistics.record(EventKind::Fixed);

        let snapshot = statistics;
        statistics.record(EventKind::Fixed);

        assert_eq!(1, snapshot.events[EventKind::Fixed]);
        assert_eq!(2, statistics.events[EventKind::Fixed]);
    }
}
