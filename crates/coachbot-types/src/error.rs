use thiserror::Error;

/// Errors from repository operations (used by trait definitions in coachbot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the session store contract.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("chat is already subscribed")]
    AlreadySubscribed,

    #[error("no session for this chat")]
    UnknownSession,

    #[error("session not found")]
    NotFound,

    #[error("persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Errors talking to the reasoning backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("backend returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// A run did not produce a usable reply.
///
/// Every variant is a `RunFailed` in the user-facing taxonomy.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("run {run_id} ended with status '{status}'{}", reason_suffix(.reason))]
    RunFailed {
        run_id: String,
        status: String,
        reason: Option<String>,
    },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl DispatchError {
    /// Whether the user sees this as a failed run.
    ///
    /// Always true: a backend fault and a non-completed run both leave the
    /// exchange without a reply.
    pub fn is_run_failed(&self) -> bool {
        match self {
            DispatchError::RunFailed { .. } | DispatchError::Backend(_) => true,
        }
    }

    /// Id of the run that ended badly, if one was created.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            DispatchError::RunFailed { run_id, .. } => Some(run_id),
            DispatchError::Backend(_) => None,
        }
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|r| format!(": {r}"))
        .unwrap_or_default()
}

/// Errors preparing an inbound modality before normalization.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("download failed: {0}")]
    Download(String),

    #[error("audio transcoding failed: {0}")]
    Transcode(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("file upload failed: {0}")]
    Upload(BackendError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the access gate.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("chat is not subscribed")]
    Unauthorized,

    #[error("invalid subscription secret")]
    InvalidCredential,

    #[error("chat is already subscribed")]
    AlreadySubscribed,

    #[error("persistence error: {0}")]
    Persistence(RepositoryError),

    #[error("thread creation failed: {0}")]
    Backend(BackendError),
}

impl From<SessionError> for GateError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::AlreadySubscribed => GateError::AlreadySubscribed,
            SessionError::UnknownSession | SessionError::NotFound => GateError::Unauthorized,
            SessionError::Persistence(e) => GateError::Persistence(e),
        }
    }
}

/// The transport could not deliver an outbound message.
#[derive(Debug, Error)]
#[error("delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Configuration could not be loaded or validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(&'static str),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Per-exchange failure taxonomy. Every variant becomes a user-facing reply;
/// none terminates the process.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("already subscribed")]
    AlreadySubscribed,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("run failed: {0}")]
    RunFailed(#[from] DispatchError),

    #[error("persistence error: {0}")]
    Persistence(RepositoryError),

    #[error("preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("unsupported message type: {0}")]
    Unsupported(String),
}

/// Why one session could not be re-engaged. Never aborts the scan.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<GateError> for RelayError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthorized => RelayError::Unauthorized,
            GateError::InvalidCredential => RelayError::InvalidCredential,
            GateError::AlreadySubscribed => RelayError::AlreadySubscribed,
            GateError::Persistence(e) => RelayError::Persistence(e),
            GateError::Backend(e) => RelayError::RunFailed(DispatchError::Backend(e)),
        }
    }
}

impl From<SessionError> for RelayError {
    fn from(err: SessionError) -> Self {
        GateError::from(err).into()
    }
}
