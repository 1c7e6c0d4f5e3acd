/// Workflow client — the single point of entry for calls to the external
/// workflow executor (resume enhancement, cover letters, job analysis).
///
/// Callers never depend on the executor being reachable: every error here is
/// meant to be caught and turned into a local fallback by the optimizer.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod schemas;

pub use schemas::{validate_input, WorkflowId};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow executor is not configured")]
    NotConfigured,

    #[error("Invalid workflow input: {0}")]
    Schema(String),

    #[error("Workflow timed out after {0:?}")]
    Timeout(Duration),

    #[error("Workflow returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Workflow rejected the request: {0}")]
    Rejected(String),

    #[error("Workflow failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<WorkflowError>,
    },
}

impl WorkflowError {
    /// Timeouts, transport failures, 429 and 5xx are worth another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            WorkflowError::Timeout(_) | WorkflowError::Http(_) => true,
            WorkflowError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub success: bool,
    pub data: Value,
    pub execution_id: String,
    /// Milliseconds, including retries.
    pub processing_time: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    data: Value,
    execution_id: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one request to the executor. Swapped out in tests.
#[async_trait]
pub trait WorkflowTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, WorkflowError>;
}

pub struct HttpTransport {
    client: Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(api_key: Option<String>) -> Result<Self, WorkflowError> {
        Ok(Self {
            client: Client::builder().build()?,
            api_key,
        })
    }
}

#[async_trait]
impl WorkflowTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, WorkflowError> {
        let mut request = self
            .client
            .post(url)
            .timeout(timeout)
            .header("content-type", "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                WorkflowError::Timeout(timeout)
            } else {
                WorkflowError::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}

pub type Backoff = Arc<dyn Fn(u32) -> Duration + Send + Sync>;

/// `base × attempt`: 1s, 2s, 3s… for a one second base.
pub fn linear_backoff(base: Duration) -> Backoff {
    Arc::new(move |attempt| base * attempt)
}

#[derive(Clone)]
pub struct WorkflowExecutor {
    config: WorkflowConfig,
    transport: Arc<dyn WorkflowTransport>,
    backoff: Backoff,
}

impl WorkflowExecutor {
    pub fn new(config: WorkflowConfig) -> Result<Self, WorkflowError> {
        let transport = HttpTransport::new(config.api_key.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: WorkflowConfig, transport: Arc<dyn WorkflowTransport>) -> Self {
        let backoff = linear_backoff(config.backoff_base);
        Self {
            config,
            transport,
            backoff,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Validates `input`, then posts it to the workflow's webhook, retrying
    /// transient failures up to `max_retries` times.
    pub async fn execute(
        &self,
        workflow: WorkflowId,
        input: Value,
    ) -> Result<WorkflowResult, WorkflowError> {
        validate_input(workflow, &input)?;

        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            workflow.path()
        );
        let timeout = workflow.timeout();
        let attempts = self.config.max_retries + 1;
        let started = Instant::now();
        let mut last_error: Option<WorkflowError> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = (self.backoff)(attempt);
                warn!(
                    "Workflow {} attempt {} failed, retrying after {}ms...",
                    workflow,
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response =
                match tokio::time::timeout(timeout, self.transport.post(&url, &input, timeout)).await {
                    Ok(result) => result,
                    Err(_) => Err(WorkflowError::Timeout(timeout)),
                }
                .and_then(check_status);

            match response {
                Ok(response) => return finish(workflow, response, started),
                Err(e) if e.is_retryable() => {
                    warn!("Workflow {} error: {}", workflow, e);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(WorkflowError::Exhausted {
            attempts,
            last: Box::new(last_error.unwrap_or(WorkflowError::Timeout(timeout))),
        })
    }

    /// Runs every job concurrently. Results come back in input order and a
    /// failing job never affects the others.
    pub async fn execute_batch(
        &self,
        jobs: Vec<(WorkflowId, Value)>,
    ) -> Vec<Result<WorkflowResult, WorkflowError>> {
        let mut slots: Vec<Option<Result<WorkflowResult, WorkflowError>>> =
            jobs.iter().map(|_| None).collect();

        let mut set = JoinSet::new();
        for (index, (workflow, input)) in jobs.into_iter().enumerate() {
            let executor = self.clone();
            set.spawn(async move { (index, executor.execute(workflow, input).await) });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!("Workflow batch task failed: {e}"),
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(WorkflowError::Rejected("workflow task did not complete".to_string()))
                })
            })
            .collect()
    }
}

fn check_status(response: TransportResponse) -> Result<TransportResponse, WorkflowError> {
    if (200..300).contains(&response.status) {
        Ok(response)
    } else {
        Err(WorkflowError::Status {
            status: response.status,
            body: response.body,
        })
    }
}

fn finish(
    workflow: WorkflowId,
    response: TransportResponse,
    started: Instant,
) -> Result<WorkflowResult, WorkflowError> {
    let envelope: WorkflowEnvelope = serde_json::from_str(&response.body)?;
    if !envelope.success {
        let reason = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "no reason given".to_string());
        return Err(WorkflowError::Rejected(reason));
    }

    let result = WorkflowResult {
        success: true,
        data: envelope.data,
        execution_id: envelope
            .execution_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        processing_time: started.elapsed().as_millis() as u64,
    };
    debug!(
        "Workflow {} succeeded: execution_id={}, processing_time={}ms",
        workflow, result.execution_id, result.processing_time
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every URL it was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse, WorkflowError>>>,
        calls: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<TransportResponse, WorkflowError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WorkflowTransport for ScriptedTransport {
        async fn post(
            &self,
            url: &str,
            _body: &Value,
            _timeout: Duration,
        ) -> Result<TransportResponse, WorkflowError> {
            self.calls.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| ok(200, r#"{"success": true}"#))
        }
    }

    /// Answers every request with its own body as `data`.
    struct EchoTransport;

    #[async_trait]
    impl WorkflowTransport for EchoTransport {
        async fn post(
            &self,
            _url: &str,
            body: &Value,
            _timeout: Duration,
        ) -> Result<TransportResponse, WorkflowError> {
            Ok(TransportResponse {
                status: 200,
                body: json!({ "success": true, "data": body }).to_string(),
            })
        }
    }

    fn ok(status: u16, body: &str) -> Result<TransportResponse, WorkflowError> {
        Ok(TransportResponse {
            status,
            body: body.to_string(),
        })
    }

    fn config() -> WorkflowConfig {
        WorkflowConfig {
            base_url: "http://workflows.local/".to_string(),
            api_key: None,
            max_retries: 2,
            backoff_base: Duration::from_millis(1000),
        }
    }

    fn job_input() -> Value {
        json!({ "jobDescription": "Senior Rust Engineer" })
    }

    #[tokio::test]
    async fn test_execute_success_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            200,
            r#"{"success": true, "data": {"title": "Engineer"}, "executionId": "exec-1"}"#,
        )]));
        let executor = WorkflowExecutor::with_transport(config(), transport.clone());

        let result = executor
            .execute(WorkflowId::JobAnalysis, job_input())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.data["title"], "Engineer");
        assert_eq!(result.execution_id, "exec-1");
        assert_eq!(
            transport.calls.lock().unwrap()[0],
            "http://workflows.local/webhook/job-analysis"
        );
    }

    #[tokio::test]
    async fn test_missing_execution_id_is_generated() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(200, r#"{"data": {}}"#)]));
        let executor = WorkflowExecutor::with_transport(config(), transport);
        let result = executor
            .execute(WorkflowId::JobAnalysis, job_input())
            .await
            .unwrap();
        assert!(Uuid::parse_str(&result.execution_id).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_server_errors_with_linear_backoff() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ok(503, "unavailable"),
            ok(500, "boom"),
            ok(200, r#"{"success": true, "data": "done"}"#),
        ]));
        let delays = Arc::new(Mutex::new(Vec::new()));
        let recorded = delays.clone();
        let executor = WorkflowExecutor::with_transport(config(), transport.clone()).with_backoff(
            Arc::new(move |attempt| {
                let delay = Duration::from_millis(1000) * attempt;
                recorded.lock().unwrap().push(delay);
                delay
            }),
        );

        let result = executor
            .execute(WorkflowId::JobAnalysis, job_input())
            .await
            .unwrap();

        assert_eq!(result.data, json!("done"));
        assert_eq!(transport.calls(), 3);
        assert_eq!(
            *delays.lock().unwrap(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_retries() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            ok(500, "a"),
            ok(502, "b"),
            ok(503, "c"),
        ]));
        let executor = WorkflowExecutor::with_transport(config(), transport.clone());

        let err = executor
            .execute(WorkflowId::JobAnalysis, job_input())
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 3);
        match err {
            WorkflowError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, WorkflowError::Status { status: 503, .. }));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_executor_times_out_per_attempt() {
        let transport = Arc::new(ScriptedTransport {
            delay: Some(Duration::from_secs(60)),
            ..Default::default()
        });
        let executor = WorkflowExecutor::with_transport(config(), transport.clone());

        let err = executor
            .execute(WorkflowId::KeywordExtraction, json!({ "text": "rust" }))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert!(matches!(
            err,
            WorkflowError::Exhausted { last, .. }
                if matches!(*last, WorkflowError::Timeout(t) if t == Duration::from_secs(20))
        ));
    }

    #[tokio::test]
    async fn test_client_errors_and_rejections_are_not_retried() {
        let transport = Arc::new(ScriptedTransport::new(vec![ok(400, "bad request")]));
        let executor = WorkflowExecutor::with_transport(config(), transport.clone());
        let err = executor
            .execute(WorkflowId::JobAnalysis, job_input())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Status { status: 400, .. }));
        assert_eq!(transport.calls(), 1);

        let transport = Arc::new(ScriptedTransport::new(vec![ok(
            200,
            r#"{"success": false, "error": "quota exceeded"}"#,
        )]));
        let executor = WorkflowExecutor::with_transport(config(), transport.clone());
        let err = executor
            .execute(WorkflowId::JobAnalysis, job_input())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Rejected(ref r) if r == "quota exceeded"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_schema_violation_never_reaches_transport() {
        let transport = Arc::new(ScriptedTransport::default());
        let executor = WorkflowExecutor::with_transport(config(), transport.clone());
        let err = executor
            .execute(WorkflowId::CoverLetter, json!({ "resumeText": "r" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Schema(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_execute_batch_preserves_order_and_isolates_failures() {
        let executor = WorkflowExecutor::with_transport(config(), Arc::new(EchoTransport));
        let results = executor
            .execute_batch(vec![
                (WorkflowId::KeywordExtraction, json!({ "text": "first" })),
                (WorkflowId::KeywordExtraction, json!({})),
                (WorkflowId::KeywordExtraction, json!({ "text": "third" })),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().data["text"], "first");
        assert!(matches!(results[1], Err(WorkflowError::Schema(_))));
        assert_eq!(results[2].as_ref().unwrap().data["text"], "third");
    }

    #[test]
    fn test_linear_backoff() {
        let backoff = linear_backoff(Duration::from_millis(1000));
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(2), Duration::from_secs(2));
    }
}
