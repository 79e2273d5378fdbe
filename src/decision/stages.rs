use std::fmt;
use std::str::FromStr;

use crate::api::StageStatus;

/// A user action on a single decision stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageAction {
    Start,
    Complete,
    Reopen,
}

impl StageAction {
    /// The one action offered for a stage in `status`.
    pub fn for_status(status: StageStatus) -> Self {
        match status {
            StageStatus::Pending => StageAction::Start,
            StageStatus::InProgress => StageAction::Complete,
            StageStatus::Completed => StageAction::Reopen,
        }
    }

    /// Whether this action may be taken from `status`.
    pub fn is_available(&self, status: StageStatus) -> bool {
        Self::for_status(status) == *self
    }

    /// Status requested from the backend when the action is taken.
    pub fn target_status(&self) -> StageStatus {
        match self {
            StageAction::Start | StageAction::Reopen => StageStatus::InProgress,
            StageAction::Complete => StageStatus::Completed,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageAction::Start => "Start Stage",
            StageAction::Complete => "Complete Stage",
            StageAction::Reopen => "Reopen Stage",
        }
    }
}

impl fmt::Display for StageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageAction::Start => write!(f, "start"),
            StageAction::Complete => write!(f, "complete"),
            StageAction::Reopen => write!(f, "reopen"),
        }
    }
}

impl FromStr for StageAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(StageAction::Start),
            "complete" => Ok(StageAction::Complete),
            "reopen" => Ok(StageAction::Reopen),
            _ => Err(format!("Unknown stage action: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_action_per_status() {
        assert_eq!(StageAction::for_status(StageStatus::Pending), StageAction::Start);
        assert_eq!(
            StageAction::for_status(StageStatus::InProgress),
            StageAction::Complete
        );
        assert_eq!(
            StageAction::for_status(StageStatus::Completed),
            StageAction::Reopen
        );
    }

    #[test]
    fn test_targets() {
        assert_eq!(StageAction::Start.target_status(), StageStatus::InProgress);
        assert_eq!(StageAction::Complete.target_status(), StageStatus::Completed);
        assert_eq!(StageAction::Reopen.target_status(), StageStatus::InProgress);
    }

    #[test]
    fn test_availability() {
        assert!(StageAction::Start.is_available(StageStatus::Pending));
        assert!(!StageAction::Start.is_available(StageStatus::InProgress));
        assert!(!StageAction::Complete.is_available(StageStatus::Pending));
        assert!(StageAction::Reopen.is_available(StageStatus::Completed));
    }

    #[test]
    fn test_parse_roundtrip() {
        for action in [StageAction::Start, StageAction::Complete, StageAction::Reopen] {
            assert_eq!(action.to_string().parse::<StageAction>(), Ok(action));
        }
        assert!("finish".parse::<StageAction>().is_err());
    }
}
