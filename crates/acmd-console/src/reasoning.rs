use crate::config::ReasoningConfig;
use acmd_core::{
    ReasoningError, ReasoningRequest, ReasoningResponse, ReasoningService, ReasoningTask,
    UnconfiguredService,
};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub const JOB_QUEUE_CAPACITY: usize = 8;

/// Which dashboard area a job reports back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobTarget {
    Intelligence,
    Detail,
}

#[derive(Debug, Clone)]
pub struct ReasoningJob {
    pub target: JobTarget,
    pub request: ReasoningRequest,
}

#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub target: JobTarget,
    pub task: ReasoningTask,
    pub result: Result<ReasoningResponse, ReasoningError>,
}

/// Runs a local program per request: request JSON on stdin, answer on stdout.
///
/// The child is killed when the returned future is dropped, so a timeout never leaves
/// it running.
#[derive(Debug, Clone)]
pub struct CommandService {
    program: String,
    args: Vec<String>,
}

impl CommandService {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub async fn complete(
        &self,
        request: &ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningError> {
        let payload = serde_json::to_vec(request)
            .map_err(|err| ReasoningError::InvalidOutput(format!("encode request: {err}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ReasoningError::Unavailable(format!("{}: {err}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|err| ReasoningError::Provider(format!("write request: {err}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| ReasoningError::Provider(format!("wait: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(ReasoningError::Provider(format!(
                "exit {code}: {}",
                stderr.trim()
            )));
        }
        parse_output(&output.stdout)
    }
}

/// JSON `{text, sources}` when stdout looks like an object, plain text otherwise.
pub fn parse_output(stdout: &[u8]) -> Result<ReasoningResponse, ReasoningError> {
    let text = std::str::from_utf8(stdout)
        .map_err(|_| ReasoningError::InvalidOutput("stdout is not UTF-8".to_string()))?
        .trim();
    if text.is_empty() {
        return Ok(ReasoningResponse::default());
    }
    if text.starts_with('{') {
        return serde_json::from_str(text)
            .map_err(|err| ReasoningError::InvalidOutput(err.to_string()));
    }
    Ok(ReasoningResponse {
        text: Some(text.to_string()),
        sources: Vec::new(),
    })
}

/// Where reasoning jobs go: a local command, or an in-process service on the blocking pool.
pub enum ReasoningBackend {
    Command(CommandService),
    InProcess(Arc<dyn ReasoningService>),
}

impl ReasoningBackend {
    pub fn from_config(config: &ReasoningConfig) -> Self {
        match config.command.as_deref().map(str::trim) {
            Some(program) if !program.is_empty() => {
                info!(program, "reasoning command configured");
                ReasoningBackend::Command(CommandService::new(program, config.args.clone()))
            }
            _ => {
                info!("no reasoning command configured; requests will fail");
                ReasoningBackend::InProcess(Arc::new(UnconfiguredService))
            }
        }
    }

    async fn complete(
        &self,
        request: ReasoningRequest,
    ) -> Result<ReasoningResponse, ReasoningError> {
        match self {
            ReasoningBackend::Command(command) => command.complete(&request).await,
            ReasoningBackend::InProcess(service) => {
                let service = Arc::clone(service);
                tokio::task::spawn_blocking(move || service.complete(&request))
                    .await
                    .map_err(|err| ReasoningError::Provider(format!("worker aborted: {err}")))?
            }
        }
    }
}

/// Receives jobs until every sender is dropped. Jobs run concurrently.
pub async fn run_worker(
    backend: Arc<ReasoningBackend>,
    timeout: Duration,
    mut jobs: mpsc::Receiver<ReasoningJob>,
    results: mpsc::Sender<ReasoningOutcome>,
) {
    while let Some(job) = jobs.recv().await {
        let backend = Arc::clone(&backend);
        let results = results.clone();
        tokio::spawn(async move {
            let outcome = execute(&backend, timeout, job).await;
            let _ = results.send(outcome).await;
        });
    }
}

pub async fn execute(
    backend: &ReasoningBackend,
    timeout: Duration,
    job: ReasoningJob,
) -> ReasoningOutcome {
    let ReasoningJob { target, request } = job;
    let task = request.task;
    info!(task = task.as_str(), ?target, "reasoning job started");

    let result = match tokio::time::timeout(timeout, backend.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(ReasoningError::Timeout {
            secs: timeout.as_secs(),
        }),
    };

    match &result {
        Ok(_) => info!(task = task.as_str(), ?target, "reasoning job finished"),
        Err(err) => warn!(task = task.as_str(), ?target, error = %err, "reasoning job failed"),
    }
    ReasoningOutcome {
        target,
        task,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sleepy(Duration);

    impl ReasoningService for Sleepy {
        fn complete(&self, _: &ReasoningRequest) -> Result<ReasoningResponse, ReasoningError> {
            std::thread::sleep(self.0);
            Ok(ReasoningResponse {
                text: Some("done".to_string()),
                sources: Vec::new(),
            })
        }
    }

    fn job(target: JobTarget) -> ReasoningJob {
        ReasoningJob {
            target,
            request: ReasoningRequest::insight("status?"),
        }
    }

    fn shell(script: &str) -> CommandService {
        CommandService::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn plain_and_json_output() {
        let plain = parse_output(b"  all systems nominal\n").expect("plain");
        assert_eq!(plain.text.as_deref(), Some("all systems nominal"));

        let json = parse_output(br#"{"text":"ok","sources":[{"uri":"https://a.example"}]}"#)
            .expect("json");
        assert_eq!(json.text.as_deref(), Some("ok"));
        assert_eq!(json.sources[0].uri, "https://a.example");
        assert_eq!(json.sources[0].title, None);

        assert_eq!(parse_output(b"\n").expect("empty"), ReasoningResponse::default());
        assert!(matches!(
            parse_output(b"{broken"),
            Err(ReasoningError::InvalidOutput(_))
        ));
    }

    #[tokio::test]
    async fn blank_command_falls_back_to_unconfigured() {
        let config = ReasoningConfig {
            command: Some("   ".to_string()),
            ..ReasoningConfig::default()
        };
        let backend = ReasoningBackend::from_config(&config);
        assert!(matches!(backend, ReasoningBackend::InProcess(_)));
        let result = backend.complete(ReasoningRequest::insight("x")).await;
        assert!(matches!(result, Err(ReasoningError::Unavailable(_))));
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let service = CommandService::new("acmd-no-such-program-xyz", Vec::new());
        let result = service.complete(&ReasoningRequest::insight("x")).await;
        assert!(matches!(result, Err(ReasoningError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_output_and_exit_status() {
        let ok = shell("cat >/dev/null; echo fine");
        let response = ok
            .complete(&ReasoningRequest::insight("x"))
            .await
            .expect("ok");
        assert_eq!(response.text.as_deref(), Some("fine"));

        let failing = shell("cat >/dev/null; echo quota >&2; exit 3");
        match failing.complete(&ReasoningRequest::insight("x")).await {
            Err(ReasoningError::Provider(message)) => {
                assert!(message.contains("exit 3"));
                assert!(message.contains("quota"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timed_out_command_is_killed() {
        let dir = tempfile::tempdir().expect("temp dir");
        let marker = dir.path().join("finished");
        let script = format!("cat >/dev/null; sleep 1; touch '{}'", marker.display());
        let backend = ReasoningBackend::Command(shell(&script));

        let outcome = execute(&backend, Duration::from_millis(100), job(JobTarget::Detail)).await;
        assert!(matches!(outcome.result, Err(ReasoningError::Timeout { .. })));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "command kept running after the timeout");
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let backend = ReasoningBackend::InProcess(Arc::new(Sleepy(Duration::from_millis(300))));
        let outcome = execute(&backend, Duration::from_millis(20), job(JobTarget::Detail)).await;
        assert_eq!(outcome.target, JobTarget::Detail);
        assert!(matches!(outcome.result, Err(ReasoningError::Timeout { .. })));
    }

    #[tokio::test]
    async fn worker_returns_results_per_target() {
        let backend = Arc::new(ReasoningBackend::InProcess(Arc::new(Sleepy(
            Duration::from_millis(1),
        ))));
        let (job_tx, job_rx) = mpsc::channel(JOB_QUEUE_CAPACITY);
        let (result_tx, mut result_rx) = mpsc::channel(JOB_QUEUE_CAPACITY);
        let worker = tokio::spawn(run_worker(
            backend,
            Duration::from_secs(5),
            job_rx,
            result_tx,
        ));

        job_tx.send(job(JobTarget::Intelligence)).await.expect("send");
        let outcome = result_rx.recv().await.expect("outcome");
        assert_eq!(outcome.target, JobTarget::Intelligence);
        assert_eq!(outcome.task, ReasoningTask::Insight);
        assert_eq!(
            outcome.result.expect("response").text.as_deref(),
            Some("done")
        );

        drop(job_tx);
        worker.await.expect("worker exits");
    }
}
