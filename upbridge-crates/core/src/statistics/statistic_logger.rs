use std::fmt::Display;

use itertools::Itertools;

use super::statistic_logging::log_statistic;

/// Prefixes the names of the statistics it logs, e.g. with the name of the propagator they belong
/// to.
#[derive(Debug, Default, Clone)]
pub struct StatisticLogger {
    name_prefix: String,
}

impl StatisticLogger {
    /// Joins the parts of the prefix with underscores.
    pub fn new<Input: IntoIterator<Item = impl Display>>(name_prefix: Input) -> Self {
        Self {
            name_prefix: name_prefix.into_iter().join("_"),
        }
    }

    /// Returns a logger whose prefix is this prefix extended with `addition_to_prefix`.
    pub fn attach_to_prefix(&self, addition_to_prefix: impl Display) -> Self {
        if self.name_prefix.is_empty() {
            return Self {
                name_prefix: addition_to_prefix.to_string(),
            };
        }

        Self {
            name_prefix: format!("{}_{}", self.name_prefix, addition_to_prefix),
        }
    }

    pub fn log_statistic(&self, value: impl Display) {
        log_statistic(&self.name_prefix, value);
    }
}

#[cfg(test)]
mod tests {
    use super::StatisticLogger;

    #[test]
    fn prefixes_are_joined_with_underscores() {
        let logger = StatisticLogger::new(["propagator", "3"]).attach_to_prefix("fixed");
        assert_eq!("propagator_3_fixed", logger.name_prefix);
    }

    #[test]
    fn an_empty_prefix_is_not_followed_by_a_separator() {
        let logger = StatisticLogger::default().attach_to_prefix("decisions");
        assert_eq!("decisions", logger.name_prefix);
    }
}
