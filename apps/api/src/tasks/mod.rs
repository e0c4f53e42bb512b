// Application tasks: the units of work that consume a generation client.
//
// Each task is plain data plus one `attempt`. `run_task` is the only place a
// failure is handed to the retry orchestrator, together with a replay closure
// that re-runs the same task in diagnostic mode.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::connectors::{ClientRequest, ConnectorError};
use crate::documents::{ExtractError, RenderError};
use crate::llm_client::{strip_json_fences, LlmError, ServiceClient};
use crate::mail::MailError;
use crate::models::outcome::OperationOutcome;
use crate::recovery::{BoxFuture, Replay};
use crate::state::AppState;

pub mod cover_letter;
pub mod email;
pub mod handlers;
pub mod prompts;
pub mod resume;

pub use cover_letter::CoverLetterTask;
pub use email::EmailTask;
pub use resume::ResumeTask;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Parsed {0} content is empty")]
    EmptyInput(&'static str),

    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Failed to parse JSON from LLM: {0}")]
    MalformedReply(#[source] serde_json::Error),

    #[error("LLM response missing '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Mail sender is not configured (set GMAIL_ACCESS_TOKEN)")]
    MailerUnavailable,

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ApplicationTask: Clone + Send + Sync + 'static {
    type Output: Send + 'static;

    /// Task name; also the client cache key and config key prefix.
    const NAME: &'static str;

    /// One try with the given client. No recovery happens in here.
    async fn attempt(
        &self,
        state: &AppState,
        client: Arc<dyn ServiceClient>,
    ) -> Result<Self::Output, TaskError>;
}

/// Runs `task` against the task's cached client. A failure goes to the retry
/// orchestrator, which may replay the task once with `diagnostic` set.
pub fn run_task<T: ApplicationTask>(
    state: AppState,
    task: T,
    diagnostic: bool,
) -> BoxFuture<OperationOutcome<T::Output>> {
    Box::pin(async move {
        let result = match state.cache.get_client(T::NAME, &ClientRequest::default()) {
            Ok(client) => {
                debug!(task = T::NAME, backend = client.backend(), "Running task");
                task.attempt(&state, client).await
            }
            Err(e) => Err(TaskError::Connector(e)),
        };

        let err = match result {
            Ok(output) => {
                info!(task = T::NAME, diagnostic, "Task completed");
                return OperationOutcome::success(output);
            }
            Err(err) => err,
        };

        error!(task = T::NAME, "Error occurred: {}", err);
        let replay: Replay<T::Output> = {
            let state = state.clone();
            let task = task.clone();
            Box::new(move || run_task(state, task, true))
        };
        state
            .orchestrator
            .recover(&err, T::NAME, diagnostic, Some(replay))
            .await
    })
}

/// Decodes a JSON reply, tolerating markdown code fences around it.
pub(crate) fn parse_reply<R: DeserializeOwned>(raw: &str) -> Result<R, TaskError> {
    serde_json::from_str(strip_json_fences(raw)).map_err(|e| {
        error!("Failed to parse JSON from LLM: {}", e);
        debug!("Raw LLM response: {}", raw);
        TaskError::MalformedReply(e)
    })
}

/// A reply field that must be present and non-blank.
pub(crate) fn required(value: Option<String>, field: &'static str) -> Result<String, TaskError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(TaskError::MissingField(field))
}

pub(crate) async fn ensure_exists(path: &Path) -> Result<(), TaskError> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(TaskError::MissingInput(path.to_path_buf()))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::config::{Config, MapSource};
    use crate::connectors::{BackendKind, ClientCache, ClientFactory, ParamName, Registry};
    use crate::documents::{DocumentRenderer, ExtractError, RenderError, TextExtractor};
    use crate::llm_client::{LlmError, ServiceClient};
    use crate::mail::{MailError, MailSender, OutgoingEmail};
    use crate::recovery::decision::test_support::ScriptedReasoner;
    use crate::recovery::{DecisionEngine, RetryOrchestrator};
    use crate::state::AppState;

    /// Replies with a fixed text, unless built with a model whose name
    /// starts with `bad`, in which case every call fails with a 404.
    pub struct ScriptedClient {
        pub model: Option<String>,
        pub reply: String,
        pub calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ServiceClient for ScriptedClient {
        async fn submit(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.model.as_deref() {
                Some(model) if model.starts_with("bad") => Err(LlmError::Api {
                    status: 404,
                    message: format!("The model '{model}' does not exist"),
                }),
                _ => Ok(self.reply.clone()),
            }
        }

        fn backend(&self) -> &'static str {
            "scripted"
        }

        fn model(&self) -> Option<&str> {
            self.model.as_deref()
        }
    }

    #[derive(Default)]
    pub struct FakeRenderer {
        pub rendered: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl DocumentRenderer for FakeRenderer {
        async fn render(
            &self,
            source: &str,
            name: &str,
            output_dir: &Path,
        ) -> Result<PathBuf, RenderError> {
            if source.trim().is_empty() {
                return Err(RenderError::EmptySource);
            }
            self.rendered
                .lock()
                .unwrap()
                .push((name.to_string(), source.to_string()));
            Ok(output_dir.join(format!("{name}_20240101_000000.pdf")))
        }
    }

    pub struct FakeExtractor(pub String);

    #[async_trait]
    impl TextExtractor for FakeExtractor {
        async fn extract_text(&self, _path: &Path) -> Result<String, ExtractError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl MailSender for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, MailError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(Some("msg-1".to_string()))
        }
    }

    pub struct TestState {
        pub state: AppState,
        pub renderer: Arc<FakeRenderer>,
        pub mailer: Arc<RecordingMailer>,
        pub submits: Arc<AtomicUsize>,
        pub decisions: Arc<AtomicUsize>,
    }

    /// State whose every backend builds a [`ScriptedClient`] replying `reply`.
    /// `reasoner` is the decision engine's fixed answer; `None` disables it.
    pub fn test_state(
        env: &[(&str, &str)],
        reply: &str,
        reasoner: Option<&str>,
        output_dir: &Path,
    ) -> TestState {
        let submits = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        for kind in BackendKind::ALL {
            let reply = reply.to_string();
            let submits = submits.clone();
            registry.register(
                kind,
                Arc::new(move |config: &crate::connectors::ResolvedConfig| {
                    Ok(Arc::new(ScriptedClient {
                        model: config.get(ParamName::Model).map(str::to_string),
                        reply: reply.clone(),
                        calls: submits.clone(),
                    }) as Arc<dyn ServiceClient>)
                }),
            );
        }

        let factory = ClientFactory::new(registry, Arc::new(MapSource::new(env.iter().copied())));
        let cache = Arc::new(ClientCache::new(factory));
        let (engine, decisions) = match reasoner {
            Some(answer) => {
                let (reasoner, calls) = ScriptedReasoner::replying(answer);
                (Some(Arc::new(DecisionEngine::new(Arc::new(reasoner)))), calls)
            }
            None => (None, Arc::new(AtomicUsize::new(0))),
        };

        let renderer = Arc::new(FakeRenderer::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState {
            config: Config::for_tests(output_dir.to_path_buf()),
            cache: cache.clone(),
            orchestrator: Arc::new(RetryOrchestrator::new(cache, engine, Duration::ZERO)),
            renderer: renderer.clone(),
            extractor: Arc::new(FakeExtractor("Jane Doe\nRust engineer".to_string())),
            mailer: Some(mailer.clone()),
        };

        TestState {
            state,
            renderer,
            mailer,
            submits,
            decisions,
        }
    }
}
