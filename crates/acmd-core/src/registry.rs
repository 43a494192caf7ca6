use crate::{AgentRecord, AgentStatus, ZERO_UPTIME};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("agent at position {position} has an empty id")]
    EmptyId { position: usize },
    #[error("duplicate agent id: {id}")]
    DuplicateId { id: String },
    #[error("agent {id} lists tag {tag:?} more than once")]
    DuplicateTag { id: String, tag: String },
    #[error("agent {id} has an empty tag")]
    EmptyTag { id: String },
}

/// Authoritative collection of agent records for a session.
///
/// The roster is fixed once built: records keep their seed order and can only be
/// mutated field by field. Every mutator addressed by an unknown id is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    agents: Vec<AgentRecord>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn from_seed(seed: Vec<AgentRecord>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(seed.len());
        for (position, agent) in seed.iter().enumerate() {
            if agent.id.trim().is_empty() {
                return Err(RegistryError::EmptyId { position });
            }
            if index.insert(agent.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicateId {
                    id: agent.id.clone(),
                });
            }
            let mut seen = HashSet::new();
            for tag in &agent.tags {
                if tag.trim().is_empty() {
                    return Err(RegistryError::EmptyTag {
                        id: agent.id.clone(),
                    });
                }
                if !seen.insert(tag.as_str()) {
                    return Err(RegistryError::DuplicateTag {
                        id: agent.id.clone(),
                        tag: tag.clone(),
                    });
                }
            }
        }
        Ok(Self {
            agents: seed,
            index,
        })
    }

    pub fn agents(&self) -> &[AgentRecord] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&AgentRecord> {
        self.index.get(id).map(|idx| &self.agents[*idx])
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut AgentRecord> {
        match self.index.get(id) {
            Some(idx) => self.agents.get_mut(*idx),
            None => {
                debug!(agent_id = id, "ignoring mutation for unknown agent");
                None
            }
        }
    }

    /// Sets the status unconditionally and returns the previous one.
    pub fn set_status(&mut self, id: &str, status: AgentStatus) -> Option<AgentStatus> {
        let agent = self.find_mut(id)?;
        let previous = agent.status;
        agent.status = status;
        Some(previous)
    }

    /// Status back to idle, tokens to zero and uptime to the zero literal.
    pub fn reset(&mut self, id: &str) -> bool {
        let Some(agent) = self.find_mut(id) else {
            return false;
        };
        agent.status = AgentStatus::Idle;
        agent.tokens_used = 0;
        agent.uptime = ZERO_UPTIME.to_string();
        true
    }

    /// Appends `tag` unless the record already carries it. Returns whether the tags changed.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> bool {
        if tag.is_empty() {
            return false;
        }
        let Some(agent) = self.find_mut(id) else {
            return false;
        };
        if agent.has_tag(tag) {
            return false;
        }
        agent.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, id: &str, tag: &str) -> bool {
        let Some(agent) = self.find_mut(id) else {
            return false;
        };
        match agent.tags.iter().position(|existing| existing == tag) {
            Some(pos) => {
                agent.tags.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Adds simulated token usage. The counter only ever grows.
    pub fn record_usage(&mut self, id: &str, tokens: u64) -> bool {
        let Some(agent) = self.find_mut(id) else {
            return false;
        };
        agent.tokens_used = agent.tokens_used.saturating_add(tokens);
        true
    }
}

/// Trims operator tag input; empty input yields `None`.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
