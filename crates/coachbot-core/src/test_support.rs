//! In-memory test doubles for the core ports.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use coachbot_types::envelope::ContentEnvelope;
use coachbot_types::error::{BackendError, DeliveryError, PreprocessError, RepositoryError};
use coachbot_types::run::{FileHandle, MessageContent, MessageRole, Run, RunStatus, ThreadMessage};
use coachbot_types::session::{ChatId, Session, ThreadId};

use crate::backend::AssistantBackend;
use crate::clock::Clock;
use crate::preprocess::{AudioTranscoder, SpeechToText};
use crate::session::repository::SessionRepository;
use crate::transport::OutboundChannel;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Midday UTC, so "one day earlier" is always a previous local date.
    pub fn fixed() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Session repository
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<Vec<Session>>,
}

impl MemorySessionRepository {
    /// Seed a session directly, bypassing the store.
    pub fn put(&self, session: Session) {
        self.sessions.lock().unwrap().push(session);
    }
}

impl SessionRepository for MemorySessionRepository {
    async fn get_session(&self, chat_id: &ChatId) -> Result<Option<Session>, RepositoryError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions.iter().find(|s| &s.chat_id == chat_id).cloned())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.iter().any(|s| s.chat_id == session.chat_id) {
            return Err(RepositoryError::Conflict(format!(
                "session for chat {} already exists",
                session.chat_id
            )));
        }
        sessions.push(session.clone());
        Ok(())
    }

    async fn update_last_interaction(
        &self,
        chat_id: &ChatId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.iter_mut().find(|s| &s.chat_id == chat_id) {
            Some(session) => {
                session.last_interaction_at = session.last_interaction_at.max(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// Assistant backend
// ---------------------------------------------------------------------------

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateThread,
    CreateMessage {
        thread_id: String,
        envelope: ContentEnvelope,
    },
    CreateRun {
        thread_id: String,
        assistant_id: String,
    },
    RetrieveRun {
        run_id: String,
    },
    ListMessages {
        thread_id: String,
        run_id: Option<String>,
    },
    UploadFile {
        file_name: String,
        size: usize,
    },
}

/// What a completed run "says".
#[derive(Debug, Clone)]
pub enum ReplyMode {
    /// Repeat the first text part of the last user message.
    Echo,
    /// Only a message attributed to some other run exists.
    ForeignRunOnly,
    /// Several messages attributed to the run, in order.
    Several(Vec<String>),
}

struct RunState {
    thread_id: ThreadId,
    assistant_id: String,
    polls_left: usize,
}

#[derive(Default)]
struct BackendState {
    calls: Vec<BackendCall>,
    last_text: HashMap<String, String>,
    runs: HashMap<String, RunState>,
    failing_threads: HashSet<String>,
    next_id: usize,
}

pub struct MockBackend {
    reply: ReplyMode,
    polls_before_terminal: usize,
    terminal_status: RunStatus,
    fail_uploads: bool,
    state: Mutex<BackendState>,
}

impl MockBackend {
    pub fn echo() -> Self {
        Self::with_reply(ReplyMode::Echo)
    }

    pub fn with_reply(reply: ReplyMode) -> Self {
        Self {
            reply,
            polls_before_terminal: 0,
            terminal_status: RunStatus::Completed,
            fail_uploads: false,
            state: Mutex::new(BackendState::default()),
        }
    }

    /// Runs report `queued`/`in_progress` for this many re-reads.
    pub fn with_polls_before_terminal(mut self, polls: usize) -> Self {
        self.polls_before_terminal = polls;
        self
    }

    pub fn with_terminal_status(mut self, status: RunStatus) -> Self {
        self.terminal_status = status;
        self
    }

    pub fn with_failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Make every message append on this thread fail.
    pub fn fail_thread(&self, thread_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_threads
            .insert(thread_id.to_string());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn next_id(state: &mut BackendState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{prefix}_{}", state.next_id)
    }

    fn assistant_message(id: String, run_id: &str, text: &str) -> ThreadMessage {
        ThreadMessage {
            id,
            role: MessageRole::Assistant,
            run_id: Some(run_id.to_string()),
            content: vec![MessageContent::Text {
                value: text.to_string(),
            }],
        }
    }
}

impl AssistantBackend for MockBackend {
    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::CreateThread);
        Ok(ThreadId::new(Self::next_id(&mut state, "thread")))
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        envelope: &ContentEnvelope,
    ) -> Result<ThreadMessage, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::CreateMessage {
            thread_id: thread_id.to_string(),
            envelope: envelope.clone(),
        });

        if state.failing_threads.contains(thread_id.as_str()) {
            return Err(BackendError::Api {
                status: 500,
                message: "thread unavailable".into(),
            });
        }

        let text = envelope.first_text().unwrap_or_default().to_string();
        state.last_text.insert(thread_id.to_string(), text.clone());
        Ok(ThreadMessage {
            id: Self::next_id(&mut state, "msg"),
            role: MessageRole::User,
            run_id: None,
            content: vec![MessageContent::Text { value: text }],
        })
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
    ) -> Result<Run, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::CreateRun {
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
        });

        let id = Self::next_id(&mut state, "run");
        let status = if self.polls_before_terminal == 0 {
            self.terminal_status
        } else {
            RunStatus::Queued
        };
        state.runs.insert(
            id.clone(),
            RunState {
                thread_id: thread_id.clone(),
                assistant_id: assistant_id.to_string(),
                polls_left: self.polls_before_terminal,
            },
        );

        Ok(Run {
            id,
            thread_id: thread_id.clone(),
            assistant_id: assistant_id.to_string(),
            status,
            last_error: None,
        })
    }

    async fn retrieve_run(
        &self,
        _thread_id: &ThreadId,
        run_id: &str,
    ) -> Result<Run, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::RetrieveRun {
            run_id: run_id.to_string(),
        });

        let terminal = self.terminal_status;
        let run = state.runs.get_mut(run_id).ok_or(BackendError::Api {
            status: 404,
            message: format!("no run {run_id}"),
        })?;
        run.polls_left = run.polls_left.saturating_sub(1);
        let status = if run.polls_left == 0 {
            terminal
        } else {
            RunStatus::InProgress
        };

        Ok(Run {
            id: run_id.to_string(),
            thread_id: run.thread_id.clone(),
            assistant_id: run.assistant_id.clone(),
            status,
            last_error: (status == RunStatus::Failed).then(|| "server_error".to_string()),
        })
    }

    async fn list_messages(
        &self,
        thread_id: &ThreadId,
        run_id: Option<&str>,
    ) -> Result<Vec<ThreadMessage>, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::ListMessages {
            thread_id: thread_id.to_string(),
            run_id: run_id.map(str::to_string),
        });

        let run_id = run_id.unwrap_or_default().to_string();
        let messages = match &self.reply {
            ReplyMode::Echo => {
                let text = state
                    .last_text
                    .get(thread_id.as_str())
                    .cloned()
                    .unwrap_or_default();
                vec![Self::assistant_message(
                    Self::next_id(&mut state, "msg"),
                    &run_id,
                    &text,
                )]
            }
            ReplyMode::ForeignRunOnly => vec![Self::assistant_message(
                Self::next_id(&mut state, "msg"),
                "run_other",
                "not for you",
            )],
            ReplyMode::Several(texts) => texts
                .iter()
                .map(|t| Self::assistant_message(Self::next_id(&mut state, "msg"), &run_id, t))
                .collect(),
        };
        Ok(messages)
    }

    async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<FileHandle, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::UploadFile {
            file_name: file_name.to_string(),
            size: bytes.len(),
        });

        if self.fail_uploads {
            return Err(BackendError::RateLimited);
        }
        Ok(FileHandle {
            id: Self::next_id(&mut state, "file"),
        })
    }
}

// ---------------------------------------------------------------------------
// Voice preprocessing
// ---------------------------------------------------------------------------

pub struct MockTranscoder {
    fail: bool,
}

impl MockTranscoder {
    /// Copies the input to the output path.
    pub fn ok() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl AudioTranscoder for MockTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), PreprocessError> {
        if self.fail {
            return Err(PreprocessError::Transcode("ffmpeg exited with 1".into()));
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}

pub struct MockStt {
    transcript: Option<String>,
    seen: Mutex<Option<PathBuf>>,
}

impl MockStt {
    pub fn ok(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
            seen: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            transcript: None,
            seen: Mutex::new(None),
        }
    }

    /// Path of the last file handed to `transcribe`.
    pub fn seen_path(&self) -> Option<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl SpeechToText for MockStt {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, PreprocessError> {
        assert!(audio_path.exists(), "transcribe called on a missing file");
        *self.seen.lock().unwrap() = Some(audio_path.to_path_buf());
        self.transcript
            .clone()
            .ok_or_else(|| PreprocessError::Transcription("401 from speech API".into()))
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<(ChatId, String)>>,
    fail: Mutex<bool>,
}

impl RecordingOutbound {
    pub fn fail_all(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl OutboundChannel for RecordingOutbound {
    async fn send_text(&self, chat_id: &ChatId, text: &str) -> Result<(), DeliveryError> {
        if *self.fail.lock().unwrap() {
            return Err(DeliveryError("chat not found".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.clone(), text.to_string()));
        Ok(())
    }
}
