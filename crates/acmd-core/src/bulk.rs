use crate::registry::Registry;
use crate::selection::Selection;
use crate::AgentStatus;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Start,
    Stop,
    Reset,
}

impl BulkAction {
    pub fn label(self) -> &'static str {
        match self {
            BulkAction::Start => "start",
            BulkAction::Stop => "stop",
            BulkAction::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub action: BulkAction,
    pub applied: Vec<String>,
    pub missing: Vec<String>,
}

impl BulkOutcome {
    pub fn touched(&self) -> usize {
        self.applied.len()
    }
}

/// Applies `action` to every id selected right now, then leaves the selection empty.
///
/// Ids the registry does not know are skipped and reported in `missing`.
pub fn apply(action: BulkAction, selection: &mut Selection, registry: &mut Registry) -> BulkOutcome {
    let targets = selection.take();
    let mut applied = Vec::with_capacity(targets.len());
    let mut missing = Vec::new();

    for id in targets {
        let hit = match action {
            BulkAction::Start => registry.set_status(&id, AgentStatus::Busy).is_some(),
            BulkAction::Stop => registry.set_status(&id, AgentStatus::Idle).is_some(),
            BulkAction::Reset => registry.reset(&id),
        };
        if hit {
            applied.push(id);
        } else {
            missing.push(id);
        }
    }

    info!(
        action = action.label(),
        applied = applied.len(),
        missing = missing.len(),
        "bulk action applied"
    );
    BulkOutcome {
        action,
        applied,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentRecord, ZERO_UPTIME};

    fn agent(id: &str) -> AgentRecord {
        AgentRecord {
            id: id.to_string(),
            name: id.to_string(),
            role: "Ops".to_string(),
            status: AgentStatus::Idle,
            tokens_used: 42,
            uptime: "5h 05m".to_string(),
            specialization: String::new(),
            description: String::new(),
            tags: vec!["keep".to_string()],
        }
    }

    fn fixture() -> (Selection, Registry) {
        let registry =
            Registry::from_seed(vec![agent("A"), agent("B"), agent("C")]).expect("registry");
        let mut selection = Selection::new();
        selection.toggle("A");
        selection.toggle("C");
        (selection, registry)
    }

    fn statuses(registry: &Registry) -> Vec<AgentStatus> {
        registry.agents().iter().map(|agent| agent.status).collect()
    }

    #[test]
    fn start_marks_only_selected_busy_and_clears_selection() {
        let (mut selection, mut registry) = fixture();
        let outcome = apply(BulkAction::Start, &mut selection, &mut registry);
        assert_eq!(
            statuses(&registry),
            vec![AgentStatus::Busy, AgentStatus::Idle, AgentStatus::Busy]
        );
        assert!(selection.is_empty());
        assert_eq!(outcome.applied, vec!["A".to_string(), "C".to_string()]);
        assert!(outcome.missing.is_empty());
    }

    #[test]
    fn stop_returns_selected_to_idle() {
        let (mut selection, mut registry) = fixture();
        registry.set_status("A", AgentStatus::Error);
        registry.set_status("B", AgentStatus::Busy);
        apply(BulkAction::Stop, &mut selection, &mut registry);
        assert_eq!(
            statuses(&registry),
            vec![AgentStatus::Idle, AgentStatus::Busy, AgentStatus::Idle]
        );
    }

    #[test]
    fn reset_matches_single_reset() {
        let (mut selection, mut registry) = fixture();
        let mut expected = registry.clone();
        expected.reset("A");
        expected.reset("C");
        apply(BulkAction::Reset, &mut selection, &mut registry);
        assert_eq!(registry.agents(), expected.agents());
        let a = registry.find("A").expect("A");
        assert_eq!(a.uptime, ZERO_UPTIME);
        assert_eq!(a.tags, vec!["keep".to_string()]);
        assert_eq!(registry.find("B").map(|b| b.tokens_used), Some(42));
    }

    #[test]
    fn unknown_ids_are_reported_and_selection_still_clears() {
        let (mut selection, mut registry) = fixture();
        selection.toggle("GHOST");
        let outcome = apply(BulkAction::Start, &mut selection, &mut registry);
        assert_eq!(outcome.missing, vec!["GHOST".to_string()]);
        assert_eq!(outcome.touched(), 2);
        assert!(selection.is_empty());
    }

    #[test]
    fn empty_selection_is_a_noop() {
        let mut selection = Selection::new();
        let (_, mut registry) = fixture();
        let before = registry.agents().to_vec();
        let outcome = apply(BulkAction::Reset, &mut selection, &mut registry);
        assert_eq!(outcome.touched(), 0);
        assert_eq!(registry.agents(), before.as_slice());
    }
}
