use crate::feed::{LogEntry, LogKind};
use crate::{AgentRecord, AgentStatus};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("roster is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported roster format; expected an array of agents or {{\"agents\": [...]}}")]
    UnsupportedShape,
}

pub fn load_roster(path: &Path) -> Result<Vec<AgentRecord>, SeedError> {
    let content = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_roster(&content)
}

/// Accepts either a bare array of agents or an object wrapping it under `agents`.
pub fn parse_roster(content: &str) -> Result<Vec<AgentRecord>, SeedError> {
    let raw: Value = serde_json::from_str(content)?;
    match raw {
        Value::Array(items) => Ok(serde_json::from_value(Value::Array(items))?),
        Value::Object(mut map) => match map.remove("agents") {
            Some(agents @ Value::Array(_)) => Ok(serde_json::from_value(agents)?),
            _ => Err(SeedError::UnsupportedShape),
        },
        _ => Err(SeedError::UnsupportedShape),
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: &str,
    name: &str,
    role: &str,
    status: AgentStatus,
    tokens_used: u64,
    uptime: &str,
    specialization: &str,
    description: &str,
    tags: &[&str],
) -> AgentRecord {
    AgentRecord {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        status,
        tokens_used,
        uptime: uptime.to_string(),
        specialization: specialization.to_string(),
        description: description.to_string(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
    }
}

/// The built-in fifteen agent fleet used when no roster file is configured.
#[rustfmt::skip]
pub fn default_roster() -> Vec<AgentRecord> {
    use AgentStatus::{Busy, Idle};
    vec![
        record("AG-01", "NEURAL_ARCHITECT", "System Design", Busy, 125_400, "14h 22m", "Deep Learning Topology", "Optimizes multi-agent communication protocols and swarm geometry.", &["core", "topology"]),
        record("AG-02", "DATA_SCAVENGER", "Ingestion", Idle, 89_000, "45h 10m", "RAG Optimization", "Real-time retrieval and indexing of unstructured web data.", &["rag", "web"]),
        record("AG-03", "LOGIC_PROVER", "Verification", Idle, 45_000, "12h 05m", "Formal Methods", "Validates agent output against symbolic logic constraints.", &["proofs"]),
        record("AG-04", "CODE_GEN_V8", "Development", Busy, 312_000, "02h 45m", "Rust/WASM", "Automated synthesis of high-performance system components.", &["rust", "wasm"]),
        record("AG-05", "THREAT_HUNTER", "Security", Idle, 12_000, "98h 12m", "Zero-Day Detection", "Monitors swarm boundaries for adversarial injection attempts.", &["perimeter"]),
        record("AG-06", "SEMANTIC_FILTER", "Moderation", Idle, 54_000, "22h 30m", "Toxicity Scoring", "Ensures all output aligns with predefined safety benchmarks.", &["safety"]),
        record("AG-07", "MARKET_ANALYST", "Finance", Busy, 67_000, "05h 15m", "Predictive Modeling", "Real-time volatility analysis and hedging strategy generation.", &["markets"]),
        record("AG-08", "DOCS_GEN_AUTO", "Documentation", Idle, 34_000, "12h 45m", "Technical Writing", "Generates API schemas and user manuals from source code.", &["docs"]),
        record("AG-09", "LOAD_BALANCER", "Infrastructure", Idle, 15_000, "200h 10m", "Traffic Shaping", "Redistributes compute loads across GPU clusters.", &["gpu", "core"]),
        record("AG-10", "UI_COMPOSER", "Frontend", Busy, 128_000, "01h 55m", "Tailwind Engine", "Rapid prototyping of atomic UI components.", &["ui"]),
        record("AG-11", "RESEARCH_SYNTH", "R&D", Idle, 210_000, "08h 22m", "Paper Summarization", "Distills latest ArXiv releases into actionable insights.", &["arxiv"]),
        record("AG-12", "QUALITY_ASSURE", "QA", Busy, 44_000, "04h 12m", "End-to-End Testing", "Simulates user interaction flows to detect regressions.", &["e2e"]),
        record("AG-13", "VOICE_ENGINE", "Multimodal", Idle, 9_800, "122h 00m", "TTS/STT", "Handles low-latency vocal interfaces and transcription.", &["audio"]),
        record("AG-14", "VECTOR_COMPACT", "Database", Busy, 88_000, "06h 40m", "Index Compression", "Prunes redundant nodes from high-dimensional vector spaces.", &["vectors", "storage"]),
        record("AG-15", "PROMPT_TUNER", "Optimization", Idle, 22_000, "15h 30m", "Few-Shot Engineering", "Iteratively refines instructions to minimize token usage.", &["prompts"]),
    ]
}

#[rustfmt::skip]
pub fn default_feed() -> Vec<LogEntry> {
    let entry = |id: &str, timestamp: &str, agent_id: &str, message: &str, kind| LogEntry {
        id: id.to_string(),
        timestamp: timestamp.to_string(),
        agent_id: agent_id.to_string(),
        message: message.to_string(),
        kind,
    };
    vec![
        entry("1", "14:20:01", "AG-01", "Re-initializing neural paths...", LogKind::Info),
        entry("2", "14:20:05", "AG-04", "Compiled module index.rs successfully.", LogKind::Success),
        entry("3", "14:21:12", "AG-07", "Detected high volatility in BTC/USD pair.", LogKind::Warning),
        entry("4", "14:21:45", "AG-10", "Rendering bento grid component...", LogKind::Info),
        entry("5", "14:22:10", "AG-05", "Scanned 1,200 requests. No threats found.", LogKind::Success),
        entry("6", "14:22:30", "AG-14", "Compacting vector index V-72...", LogKind::Info),
    ]
}
