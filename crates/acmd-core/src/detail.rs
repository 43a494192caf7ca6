use crate::registry::Registry;
use crate::{AgentContext, AgentRecord, AgentStatus};

/// The single agent opened for inspection.
///
/// The registry stays the owner of the committed status. `pending_status` only records
/// the last choice made from this view so a report request can carry it; it is never
/// read back as the displayed value while the record exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailView {
    open_id: Option<String>,
    pending_status: Option<AgentStatus>,
}

impl DetailView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or retargets to) `id`, seeding the pending status from the registry.
    pub fn open(&mut self, id: &str, registry: &Registry) {
        self.open_id = Some(id.to_string());
        self.pending_status = registry.find(id).map(|agent| agent.status);
    }

    pub fn close(&mut self) {
        self.open_id = None;
        self.pending_status = None;
    }

    pub fn is_open(&self) -> bool {
        self.open_id.is_some()
    }

    pub fn open_id(&self) -> Option<&str> {
        self.open_id.as_deref()
    }

    pub fn pending_status(&self) -> Option<AgentStatus> {
        self.pending_status
    }

    /// The open record, if it still exists.
    pub fn record<'a>(&self, registry: &'a Registry) -> Option<&'a AgentRecord> {
        self.open_id.as_deref().and_then(|id| registry.find(id))
    }

    pub fn displayed_status(&self, registry: &Registry) -> Option<AgentStatus> {
        self.record(registry).map(|agent| agent.status)
    }

    /// Commits `status` for the open agent. Returns the previous committed status.
    pub fn set_status(
        &mut self,
        status: AgentStatus,
        registry: &mut Registry,
    ) -> Option<AgentStatus> {
        let id = self.open_id.as_deref()?;
        let previous = registry.set_status(id, status)?;
        self.pending_status = Some(status);
        Some(previous)
    }

    pub fn reset(&mut self, registry: &mut Registry) -> bool {
        let Some(id) = self.open_id.as_deref() else {
            return false;
        };
        if !registry.reset(id) {
            return false;
        }
        self.pending_status = Some(AgentStatus::Idle);
        true
    }

    /// Context for a report request, carrying the status chosen in this view.
    pub fn report_context(&self, registry: &Registry) -> Option<AgentContext> {
        let agent = self.record(registry)?;
        let mut context = agent.context();
        if let Some(status) = self.pending_status {
            context.status = status;
        }
        Some(context)
    }
}
