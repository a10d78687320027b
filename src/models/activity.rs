use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Watering,
    Spraying,
    Fertilizing,
    Pruning,
    Monitoring,
    Other,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Watering => "Watering",
            ActivityType::Spraying => "Spraying",
            ActivityType::Fertilizing => "Fertilizing",
            ActivityType::Pruning => "Pruning",
            ActivityType::Monitoring => "Monitoring",
            ActivityType::Other => "Other",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub action_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub status: ActionStatus,
}

/// A farming action already logged by the activity journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub plot: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_action: Option<PendingAction>,
}

impl ActivityRecord {
    pub fn new(
        plot: impl Into<String>,
        date: NaiveDate,
        activity_type: ActivityType,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            date,
            activity_type,
            plot: plot.into(),
            notes: notes.into(),
            pending_action: None,
        }
    }

    pub fn with_pending(mut self, action_text: impl Into<String>, due: Option<NaiveDate>) -> Self {
        self.pending_action = Some(PendingAction {
            action_text: action_text.into(),
            due_date: due,
            status: ActionStatus::Pending,
        });
        self
    }

    pub fn is_pending(&self) -> bool {
        self.pending_action
            .as_ref()
            .map(|p| p.status == ActionStatus::Pending)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_deserializes_type_field() {
        let json = r#"{
            "date": "2026-02-27",
            "type": "spraying",
            "plot": "mangosteen-valley",
            "notes": "Copper spray on lower canopy",
            "pending_action": {
                "action_text": "Re-check leaf spots",
                "due_date": "2026-03-03",
                "status": "pending"
            }
        }"#;
        let record: ActivityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.activity_type, ActivityType::Spraying);
        assert!(record.is_pending());
    }

    #[test]
    fn completed_action_is_not_pending() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        let mut record = ActivityRecord::new("nursery", date, ActivityType::Watering, "")
            .with_pending("Flush drip lines", None);
        assert!(record.is_pending());

        if let Some(action) = record.pending_action.as_mut() {
            action.status = ActionStatus::Completed;
        }
        assert!(!record.is_pending());
    }
}
