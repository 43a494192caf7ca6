//! Filtered and sorted roster view.
//!
//! Everything here is a pure function of the records and the query parameters, so the
//! view can be recomputed on every frame.

use crate::AgentRecord;
use feruca::Collator;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Tokens,
    Uptime,
}

impl SortKey {
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Tokens => "usage",
            SortKey::Uptime => "uptime",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortKey::Name => SortKey::Tokens,
            SortKey::Tokens => SortKey::Uptime,
            SortKey::Uptime => SortKey::Name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub sort: SortKey,
}

impl ViewQuery {
    pub fn apply<'a>(&self, agents: &'a [AgentRecord]) -> Vec<&'a AgentRecord> {
        derive_view(agents, &self.search, self.sort)
    }
}

/// Filters by `term` then sorts by `sort`. Equal keys keep their roster order.
pub fn derive_view<'a>(
    agents: &'a [AgentRecord],
    term: &str,
    sort: SortKey,
) -> Vec<&'a AgentRecord> {
    let needle = term.to_lowercase();
    let mut view: Vec<&AgentRecord> = agents
        .iter()
        .filter(|agent| matches_lowered(agent, &needle))
        .collect();

    match sort {
        SortKey::Name => {
            let mut collator = Collator::default();
            view.sort_by(|a, b| collate_names(&mut collator, &a.name, &b.name))
        }
        SortKey::Tokens => view.sort_by(|a, b| b.tokens_used.cmp(&a.tokens_used)),
        SortKey::Uptime => {
            view.sort_by_cached_key(|agent| std::cmp::Reverse(uptime_minutes(&agent.uptime)))
        }
    }
    view
}

/// Case-insensitive substring match over name, role, specialization and tags.
pub fn matches(agent: &AgentRecord, term: &str) -> bool {
    matches_lowered(agent, &term.to_lowercase())
}

fn matches_lowered(agent: &AgentRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |field: &str| field.to_lowercase().contains(needle);
    hit(agent.name.as_str())
        || hit(agent.role.as_str())
        || hit(agent.specialization.as_str())
        || agent.tags.iter().any(|tag| hit(tag.as_str()))
}

/// Unicode collation order (CLDR root): accents and case are secondary to the base
/// letter, lowercase before uppercase. Raw text breaks any remaining tie.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collate_names(&mut Collator::default(), a, b)
}

fn collate_names(collator: &mut Collator, a: &str, b: &str) -> Ordering {
    collator.collate(a, b).then_with(|| a.cmp(b))
}

fn uptime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*$").expect("uptime pattern compiles")
    })
}

/// Total minutes in an uptime string such as `14h 22m`, `3h` or `45m`.
///
/// Anything that does not fit that shape counts as zero.
pub fn uptime_minutes(text: &str) -> u64 {
    let Some(caps) = uptime_pattern().captures(text) else {
        return 0;
    };
    let hours = caps.get(1);
    let minutes = caps.get(2);
    if hours.is_none() && minutes.is_none() {
        return 0;
    }
    let parse = |m: Option<regex::Match<'_>>| -> Option<u64> {
        match m {
            Some(m) => m.as_str().parse::<u64>().ok(),
            None => Some(0),
        }
    };
    match (parse(hours), parse(minutes)) {
        (Some(h), Some(m)) => h.checked_mul(60).and_then(|h| h.checked_add(m)).unwrap_or(0),
        _ => 0,
    }
}
