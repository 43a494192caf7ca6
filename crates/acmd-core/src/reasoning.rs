//! Contract with the external reasoning service and the display state of one request slot.

use crate::AgentContext;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningTask {
    /// Free-form operator question.
    Insight,
    /// Optimization suggestions for one agent.
    Analysis,
    /// Short status report for one agent, with source references.
    Report,
}

impl ReasoningTask {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasoningTask::Insight => "insight",
            ReasoningTask::Analysis => "analysis",
            ReasoningTask::Report => "report",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            ReasoningTask::Insight => "Thinking cycle failed. Inspect logs for details.",
            ReasoningTask::Analysis => "Error connecting to the reasoning service.",
            ReasoningTask::Report => "Report generation failed.",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            ReasoningTask::Insight => "No response from logic core.",
            ReasoningTask::Analysis => "Failed to retrieve analysis.",
            ReasoningTask::Report => "No report available.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasoningRequest {
    pub task: ReasoningTask,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AgentContext>,
}

impl ReasoningRequest {
    pub fn insight(query: &str) -> Self {
        Self {
            task: ReasoningTask::Insight,
            prompt: query.to_string(),
            context: None,
        }
    }

    pub fn analysis(context: &AgentContext) -> Self {
        let prompt = format!(
            "Analyze this AI Agent and suggest 3 high-impact optimization strategies.\n\
             Agent Name: {}\nRole: {}\nDescription: {}",
            context.name, context.role, context.description
        );
        Self {
            task: ReasoningTask::Analysis,
            prompt,
            context: Some(context.clone()),
        }
    }

    pub fn report(context: &AgentContext) -> Self {
        let prompt = format!(
            "Create a brief markdown report for the status of Agent {}. Current status: {}. Tokens: {}.",
            context.name, context.status, context.tokens_used
        );
        Self {
            task: ReasoningTask::Report,
            prompt,
            context: Some(context.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundingSource {
    #[serde(default)]
    pub title: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReasoningResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReasoningError {
    #[error("reasoning service unavailable: {0}")]
    Unavailable(String),
    #[error("reasoning request timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("reasoning provider error: {0}")]
    Provider(String),
    #[error("reasoning output invalid: {0}")]
    InvalidOutput(String),
}

pub trait ReasoningService: Send + Sync {
    fn complete(&self, request: &ReasoningRequest) -> Result<ReasoningResponse, ReasoningError>;
}

/// Used when no backend is configured; every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredService;

impl ReasoningService for UnconfiguredService {
    fn complete(&self, _request: &ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
        Err(ReasoningError::Unavailable(
            "no reasoning command configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOutput {
    pub task: ReasoningTask,
    pub text: String,
    pub sources: Vec<GroundingSource>,
    pub failed: bool,
}

/// One request/response area of the dashboard: a busy flag and the last thing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferenceSlot {
    in_flight: bool,
    output: Option<InferenceOutput>,
}

impl InferenceSlot {
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn output(&self) -> Option<&InferenceOutput> {
        self.output.as_ref()
    }

    /// Marks the slot busy and clears the previous output. Refused while busy.
    pub fn begin(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        self.output = None;
        true
    }

    /// Records a result. Busy is cleared on every path.
    pub fn finish(
        &mut self,
        task: ReasoningTask,
        result: Result<ReasoningResponse, ReasoningError>,
    ) -> &InferenceOutput {
        self.in_flight = false;
        let output = match result {
            Ok(response) => match response.text.filter(|text| !text.trim().is_empty()) {
                Some(text) => InferenceOutput {
                    task,
                    text,
                    sources: response.sources,
                    failed: false,
                },
                None => InferenceOutput {
                    task,
                    text: task.empty_message().to_string(),
                    sources: response.sources,
                    failed: false,
                },
            },
            Err(_) => InferenceOutput {
                task,
                text: task.failure_message().to_string(),
                sources: Vec::new(),
                failed: true,
            },
        };
        self.output.insert(output)
    }

    /// Drops the output without touching the busy flag.
    pub fn clear_output(&mut self) {
        self.output = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AgentStatus;

    fn context() -> AgentContext {
        AgentContext {
            name: "LOGIC_PROVER".to_string(),
            role: "Verification".to_string(),
            description: "Validates output.".to_string(),
            status: AgentStatus::Busy,
            tokens_used: 45_000,
        }
    }

    #[test]
    fn prompts_carry_agent_details() {
        let analysis = ReasoningRequest::analysis(&context());
        assert!(analysis.prompt.contains("Agent Name: LOGIC_PROVER"));
        assert!(analysis.prompt.contains("Role: Verification"));
        let report = ReasoningRequest::report(&context());
        assert!(report.prompt.contains("Current status: busy"));
        assert!(report.prompt.contains("Tokens: 45000"));
        assert_eq!(ReasoningRequest::insight("why?").context, None);
    }

    #[test]
    fn begin_is_refused_while_in_flight() {
        let mut slot = InferenceSlot::default();
        assert!(slot.begin());
        assert!(slot.in_flight());
        assert!(!slot.begin());
    }

    #[test]
    fn failure_becomes_fixed_message_and_clears_busy() {
        let mut slot = InferenceSlot::default();
        slot.begin();
        let output = slot
            .finish(
                ReasoningTask::Insight,
                Err(ReasoningError::Timeout { secs: 60 }),
            )
            .clone();
        assert!(!slot.in_flight());
        assert!(output.failed);
        assert_eq!(output.text, "Thinking cycle failed. Inspect logs for details.");
    }

    #[test]
    fn blank_text_becomes_empty_message() {
        let mut slot = InferenceSlot::default();
        slot.begin();
        let response = ReasoningResponse {
            text: Some("  ".to_string()),
            sources: Vec::new(),
        };
        let output = slot.finish(ReasoningTask::Analysis, Ok(response)).clone();
        assert!(!output.failed);
        assert_eq!(output.text, "Failed to retrieve analysis.");
    }

    #[test]
    fn report_keeps_sources() {
        let mut slot = InferenceSlot::default();
        slot.begin();
        let response = ReasoningResponse {
            text: Some("# Report".to_string()),
            sources: vec![GroundingSource {
                title: Some("status page".to_string()),
                uri: "https://status.example".to_string(),
            }],
        };
        slot.finish(ReasoningTask::Report, Ok(response));
        let output = slot.output().expect("output");
        assert_eq!(output.text, "# Report");
        assert_eq!(output.sources.len(), 1);
    }

    #[test]
    fn late_result_without_begin_is_still_shown() {
        let mut slot = InferenceSlot::default();
        let response = ReasoningResponse {
            text: Some("late".to_string()),
            sources: Vec::new(),
        };
        slot.finish(ReasoningTask::Insight, Ok(response));
        assert_eq!(slot.output().map(|o| o.text.as_str()), Some("late"));
    }

    #[test]
    fn unconfigured_service_always_fails() {
        let result = UnconfiguredService.complete(&ReasoningRequest::insight("hello"));
        assert!(matches!(result, Err(ReasoningError::Unavailable(_))));
    }
}
