// Scripted Gemini backend shared by the integration tests
// Author: kelexine (https://github.com/kelexine)

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doccache_chat::cache::{
    CacheInitializer, CacheSettings, DocumentReference, FileState, PollPolicy, RemoteFile,
};
use doccache_chat::error::{ChatError, Result};
use doccache_chat::gemini::{
    CachedContentResponse, CreateCachedContentRequest, GeminiBackend, GenerateContentRequest,
    GenerateContentResponse, Part,
};
use doccache_chat::query::QueryForwarder;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

pub const FILE_NAME: &str = "files/doc-1";
pub const FILE_URI: &str = "https://generativelanguage.googleapis.com/v1beta/files/doc-1";
pub const CACHE_NAME: &str = "cachedContents/cache-1";
pub const MODEL: &str = "models/gemini-1.5-flash-001";
pub const INSTRUCTION: &str = "Answer ONLY from the cached PDF.";

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload,
    GetFile,
    CreateCache,
    DeleteCache(String),
    Generate { model: String, cache: String, text: String },
}

enum Generation {
    Text(String),
    NoCandidates,
    Fail,
    /// Wait for the test to release each question through `gate`.
    Gated(mpsc::UnboundedSender<String>),
}

pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    status_checks: Mutex<Vec<Instant>>,
    cache_requests: Mutex<Vec<CreateCachedContentRequest>>,
    file_states: Mutex<VecDeque<FileState>>,
    fail_upload: bool,
    fail_cache: bool,
    cache_delay: Duration,
    cache_expiry: Option<DateTime<Utc>>,
    generation: Generation,
    gates: Mutex<HashMap<String, oneshot::Receiver<Option<String>>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    /// File is ready on the first status check; questions get "Answer".
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            status_checks: Mutex::new(Vec::new()),
            cache_requests: Mutex::new(Vec::new()),
            file_states: Mutex::new(VecDeque::new()),
            fail_upload: false,
            fail_cache: false,
            cache_delay: Duration::ZERO,
            cache_expiry: None,
            generation: Generation::Text("Answer".to_string()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// States reported by successive status checks; `Ready` once exhausted.
    pub fn with_file_states(self, states: impl IntoIterator<Item = FileState>) -> Self {
        *self.file_states.lock() = states.into_iter().collect();
        self
    }

    pub fn pending_times(self, n: usize) -> Self {
        self.with_file_states(std::iter::repeat(FileState::Pending).take(n))
    }

    pub fn failing_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn failing_cache(mut self) -> Self {
        self.fail_cache = true;
        self
    }

    /// Cache creation takes `delay` after the request is recorded.
    pub fn slow_cache(mut self, delay: Duration) -> Self {
        self.cache_delay = delay;
        self
    }

    /// Created caches report `expire_time` instead of omitting it.
    pub fn cache_expiring_at(mut self, expire_time: DateTime<Utc>) -> Self {
        self.cache_expiry = Some(expire_time);
        self
    }

    pub fn answering(mut self, text: impl Into<String>) -> Self {
        self.generation = Generation::Text(text.into());
        self
    }

    pub fn without_candidates(mut self) -> Self {
        self.generation = Generation::NoCandidates;
        self
    }

    pub fn failing_generation(mut self) -> Self {
        self.generation = Generation::Fail;
        self
    }

    /// Generation waits on a gate per question. The receiver yields each
    /// question as its request arrives.
    pub fn gated(mut self) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.generation = Generation::Gated(tx);
        (self, rx)
    }

    /// Register the gate for `text`. Send `Some(answer)` or `None` (failure).
    pub fn gate(&self, text: &str) -> oneshot::Sender<Option<String>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(text.to_string(), rx);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matches(call)).count()
    }

    pub fn generate_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::Generate { .. }))
    }

    pub fn status_check_times(&self) -> Vec<Instant> {
        self.status_checks.lock().clone()
    }

    pub fn cache_requests(&self) -> Vec<CreateCachedContentRequest> {
        self.cache_requests.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

fn rejected(message: &str) -> ChatError {
    ChatError::GeminiApi {
        status: 500,
        message: message.to_string(),
    }
}

#[async_trait]
impl GeminiBackend for FakeBackend {
    async fn upload_file(&self, document: &DocumentReference) -> Result<RemoteFile> {
        self.record(Call::Upload);
        if self.fail_upload {
            return Err(rejected("upload rejected"));
        }
        Ok(RemoteFile {
            name: FILE_NAME.to_string(),
            mime_type: document.mime_type.clone(),
            uri: None,
            state: FileState::Pending,
        })
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile> {
        self.record(Call::GetFile);
        self.status_checks.lock().push(Instant::now());

        let state = self.file_states.lock().pop_front().unwrap_or(FileState::Ready);
        Ok(RemoteFile {
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            uri: (state == FileState::Ready).then(|| FILE_URI.to_string()),
            state,
        })
    }

    async fn create_cached_content(
        &self,
        request: &CreateCachedContentRequest,
    ) -> Result<CachedContentResponse> {
        self.record(Call::CreateCache);
        self.cache_requests.lock().push(request.clone());
        if !self.cache_delay.is_zero() {
            tokio::time::sleep(self.cache_delay).await;
        }
        if self.fail_cache {
            return Err(rejected("cache rejected"));
        }
        Ok(CachedContentResponse {
            name: CACHE_NAME.to_string(),
            model: Some(request.model.clone()),
            display_name: Some(request.display_name.clone()),
            create_time: None,
            expire_time: self.cache_expiry,
        })
    }

    async fn delete_cached_content(&self, name: &str) -> Result<()> {
        self.record(Call::DeleteCache(name.to_string()));
        Ok(())
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let text = request
            .contents
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect::<String>();
        self.record(Call::Generate {
            model: model.to_string(),
            cache: request.cached_content.clone(),
            text: text.clone(),
        });

        match &self.generation {
            Generation::Text(answer) => Ok(GenerateContentResponse::from_text(answer.clone())),
            Generation::NoCandidates => Ok(GenerateContentResponse::default()),
            Generation::Fail => Err(rejected("generation rejected")),
            Generation::Gated(started) => {
                let gate = self.gates.lock().remove(&text);
                let _ = started.send(text.clone());
                let Some(gate) = gate else {
                    return Err(rejected("no gate registered"));
                };
                match gate.await {
                    Ok(Some(answer)) => Ok(GenerateContentResponse::from_text(answer)),
                    _ => Err(rejected("gate closed")),
                }
            }
        }
    }
}

pub fn document() -> DocumentReference {
    DocumentReference::new("assets/law.pdf", "Founders Guide to UK Crypto Law", 600)
}

pub fn settings() -> CacheSettings {
    CacheSettings {
        model: MODEL.to_string(),
        system_instruction: INSTRUCTION.to_string(),
    }
}

pub fn fast_poll() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(1),
        max_attempts: 10,
    }
}

pub fn stack(
    backend: Arc<FakeBackend>,
    poll: PollPolicy,
) -> (Arc<CacheInitializer>, Arc<QueryForwarder>) {
    let backend: Arc<dyn GeminiBackend> = backend;
    (
        Arc::new(CacheInitializer::new(backend.clone(), settings(), poll)),
        Arc::new(QueryForwarder::new(backend)),
    )
}
