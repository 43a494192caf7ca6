use acmd_core::query::{compare_names, matches, uptime_minutes};
use acmd_core::seed::default_roster;
use acmd_core::{
    bulk, derive_view, AgentStatus, BulkAction, Registry, Selection, SortKey, ZERO_UPTIME,
};
use proptest::prelude::*;

fn registry() -> Registry {
    Registry::from_seed(default_roster()).expect("default roster is valid")
}

fn any_status() -> impl Strategy<Value = AgentStatus> {
    prop::sample::select(AgentStatus::ALL.to_vec())
}

fn any_id() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u8..=15).prop_map(|n| format!("AG-{n:02}")),
        Just("AG-99".to_string()),
    ]
}

proptest! {
    #[test]
    fn status_is_always_last_value_set(updates in prop::collection::vec(any_status(), 1..20)) {
        let mut registry = registry();
        for status in &updates {
            registry.set_status("AG-03", *status);
        }
        let last = *updates.last().expect("non-empty");
        prop_assert_eq!(registry.find("AG-03").map(|a| a.status), Some(last));
    }

    #[test]
    fn reset_is_idempotent(id in any_id(), tokens in 0u64..1_000_000) {
        let mut registry = registry();
        registry.record_usage(&id, tokens);
        registry.reset(&id);
        let once = registry.agents().to_vec();
        registry.reset(&id);
        prop_assert_eq!(registry.agents(), once.as_slice());
    }

    #[test]
    fn add_then_remove_restores_tags(tag in "[a-z]{1,8}") {
        let mut registry = registry();
        let before = registry.find("AG-14").map(|a| a.tags.clone()).expect("AG-14");
        let added = registry.add_tag("AG-14", &tag);
        registry.add_tag("AG-14", &tag);
        let after_add = registry.find("AG-14").map(|a| a.tags.clone()).expect("AG-14");
        let occurrences = after_add.iter().filter(|t| **t == tag).count();
        prop_assert_eq!(occurrences, 1);

        if added {
            registry.remove_tag("AG-14", &tag);
            let restored = registry.find("AG-14").map(|a| a.tags.clone()).expect("AG-14");
            prop_assert_eq!(restored, before);
        }
    }

    #[test]
    fn filter_partitions_the_roster(term in "[a-zA-Z_ ]{0,4}") {
        let roster = default_roster();
        let view = derive_view(&roster, &term, SortKey::Name);
        for agent in &roster {
            let shown = view.iter().any(|shown| shown.id == agent.id);
            prop_assert_eq!(shown, matches(agent, &term));
        }
    }

    #[test]
    fn sorting_never_duplicates_records(term in "[a-z]{0,2}", key in prop::sample::select(vec![SortKey::Name, SortKey::Tokens, SortKey::Uptime])) {
        let roster = default_roster();
        let view = derive_view(&roster, &term, key);
        let mut ids: Vec<&str> = view.iter().map(|a| a.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), view.len());
    }

    #[test]
    fn uptime_parse_never_panics(text in ".{0,16}") {
        let _ = uptime_minutes(&text);
    }

    #[test]
    fn bulk_touches_exactly_the_selection(picks in prop::collection::btree_set(1u8..=15, 0..6)) {
        let mut registry = registry();
        let mut selection = Selection::new();
        for n in &picks {
            selection.toggle(&format!("AG-{n:02}"));
        }
        let before = registry.agents().to_vec();
        bulk::apply(BulkAction::Reset, &mut selection, &mut registry);
        prop_assert!(selection.is_empty());
        for (old, new) in before.iter().zip(registry.agents()) {
            let picked = picks.iter().any(|n| format!("AG-{n:02}") == old.id);
            if picked {
                prop_assert_eq!(new.status, AgentStatus::Idle);
                prop_assert_eq!(new.tokens_used, 0);
                prop_assert_eq!(new.uptime.as_str(), ZERO_UPTIME);
                prop_assert_eq!(&new.tags, &old.tags);
            } else {
                prop_assert_eq!(new, old);
            }
        }
    }
}

#[test]
fn empty_search_sorted_by_name_returns_whole_roster() {
    let roster = default_roster();
    let view = derive_view(&roster, "", SortKey::Name);
    assert_eq!(view.len(), roster.len());
    let names: Vec<&str> = view.iter().map(|a| a.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_by(|a, b| compare_names(a, b));
    assert_eq!(names, sorted);
}

#[test]
fn uptime_sort_puts_longest_running_first() {
    let roster = default_roster();
    let view = derive_view(&roster, "", SortKey::Uptime);
    assert_eq!(view.first().map(|a| a.id.as_str()), Some("AG-09"));
    assert_eq!(view.last().map(|a| a.id.as_str()), Some("AG-10"));
}

#[test]
fn bulk_start_scenario() {
    let mut registry = registry();
    for id in ["AG-01", "AG-02", "AG-03"] {
        registry.set_status(id, AgentStatus::Idle);
    }
    let mut selection = Selection::new();
    selection.toggle("AG-01");
    selection.toggle("AG-03");
    bulk::apply(BulkAction::Start, &mut selection, &mut registry);
    let status = |id: &str| registry.find(id).map(|a| a.status);
    assert_eq!(status("AG-01"), Some(AgentStatus::Busy));
    assert_eq!(status("AG-02"), Some(AgentStatus::Idle));
    assert_eq!(status("AG-03"), Some(AgentStatus::Busy));
    assert!(selection.is_empty());
}
