use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod bulk;
pub mod detail;
pub mod feed;
pub mod query;
pub mod reasoning;
pub mod registry;
pub mod seed;
pub mod selection;
pub mod stats;

pub use bulk::{BulkAction, BulkOutcome};
pub use detail::DetailView;
pub use feed::{LogEntry, LogFeed, LogKind, FEED_CAPACITY};
pub use query::{derive_view, SortKey, ViewQuery};
pub use reasoning::{
    GroundingSource, InferenceOutput, InferenceSlot, ReasoningError, ReasoningRequest,
    ReasoningResponse, ReasoningService, ReasoningTask, UnconfiguredService,
};
pub use registry::{normalize_tag, Registry, RegistryError};
pub use selection::Selection;
pub use stats::FleetStats;

/// Uptime literal written by a reset.
pub const ZERO_UPTIME: &str = "0h 00m";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub status: AgentStatus,
    pub tokens_used: u64,
    pub uptime: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl AgentRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|existing| existing == tag)
    }

    pub fn context(&self) -> AgentContext {
        AgentContext {
            name: self.name.clone(),
            role: self.role.clone(),
            description: self.description.clone(),
            status: self.status,
            tokens_used: self.tokens_used,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Busy,
    Error,
    Offline,
}

impl AgentStatus {
    pub const ALL: [AgentStatus; 4] = [
        AgentStatus::Idle,
        AgentStatus::Busy,
        AgentStatus::Error,
        AgentStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
            AgentStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "idle" => Ok(AgentStatus::Idle),
            "busy" => Ok(AgentStatus::Busy),
            "error" => Ok(AgentStatus::Error),
            "offline" => Ok(AgentStatus::Offline),
            other => Err(format!("Unknown status: {other}")),
        }
    }
}

/// Agent details attached to a reasoning request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    pub name: String,
    pub role: String,
    pub description: String,
    pub status: AgentStatus,
    pub tokens_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("BUSY".parse::<AgentStatus>(), Ok(AgentStatus::Busy));
        assert_eq!(" offline ".parse::<AgentStatus>(), Ok(AgentStatus::Offline));
        assert!("paused".parse::<AgentStatus>().is_err());
    }

    #[test]
    fn status_round_trips_through_display() {
        for status in AgentStatus::ALL {
            assert_eq!(status.to_string().parse::<AgentStatus>(), Ok(status));
        }
    }

    #[test]
    fn record_deserializes_camel_case_and_defaults_tags() {
        let record: AgentRecord = serde_json::from_str(
            r#"{"id":"AG-01","name":"N","role":"R","status":"busy","tokensUsed":12,"uptime":"1h 00m"}"#,
        )
        .expect("record");
        assert_eq!(record.status, AgentStatus::Busy);
        assert_eq!(record.tokens_used, 12);
        assert!(record.tags.is_empty());
        assert!(record.specialization.is_empty());
    }

    #[test]
    fn unknown_status_is_rejected_by_serde() {
        let parsed = serde_json::from_str::<AgentRecord>(
            r#"{"id":"AG-01","name":"N","role":"R","status":"paused","tokensUsed":1,"uptime":""}"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn negative_tokens_are_unrepresentable() {
        let parsed = serde_json::from_str::<AgentRecord>(
            r#"{"id":"AG-01","name":"N","role":"R","status":"idle","tokensUsed":-5,"uptime":""}"#,
        );
        assert!(parsed.is_err());
    }
}
