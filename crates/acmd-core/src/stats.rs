use crate::{AgentRecord, AgentStatus};

/// Fleet-wide counters derived from the current roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetStats {
    pub total: usize,
    pub active: usize,
    pub idle: usize,
    pub errored: usize,
    pub offline: usize,
    pub total_tokens: u64,
}

impl FleetStats {
    pub fn from_agents(agents: &[AgentRecord]) -> Self {
        let mut stats = FleetStats {
            total: agents.len(),
            ..Default::default()
        };
        for agent in agents {
            match agent.status {
                AgentStatus::Busy => stats.active += 1,
                AgentStatus::Idle => stats.idle += 1,
                AgentStatus::Error => stats.errored += 1,
                AgentStatus::Offline => stats.offline += 1,
            }
            stats.total_tokens = stats.total_tokens.saturating_add(agent.tokens_used);
        }
        stats
    }

    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.errored as f64 / self.total as f64
    }

    pub fn active_label(&self) -> String {
        format!("{}/{}", self.active, self.total)
    }

    pub fn tokens_label(&self) -> String {
        format!("{:.3}M", self.total_tokens as f64 / 1_000_000.0)
    }

    pub fn error_rate_label(&self) -> String {
        format!("{:.2}%", self.error_rate() * 100.0)
    }
}
