use serde::Serialize;

/// Classification of a failed model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingCredentials,
    UpstreamUnavailable,
    MalformedUpstreamResponse,
    InvalidInput,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::MissingCredentials => "missing_credentials",
            FailureKind::UpstreamUnavailable => "upstream_unavailable",
            FailureKind::MalformedUpstreamResponse => "malformed_upstream_response",
            FailureKind::InvalidInput => "invalid_input",
        }
    }
}

/// Tagged failure returned by the gateway. Never carries the API key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {detail}", .kind.as_str())]
pub struct GatewayFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl GatewayFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn missing_credentials() -> Self {
        Self::new(
            FailureKind::MissingCredentials,
            "GEMINI_API_KEY or GOOGLE_API_KEY not set",
        )
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::UpstreamUnavailable, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::MalformedUpstreamResponse, detail)
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, detail)
    }
}

/// Errors that escape the orchestrator to the caller.
///
/// Credential and upstream problems never show up here; they are absorbed
/// into mock or degraded results.
#[derive(Debug, thiserror::Error)]
pub enum GuidanceError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl GuidanceError {
    pub fn kind(&self) -> &'static str {
        match self {
            GuidanceError::InvalidInput(_) => "invalid_input",
            GuidanceError::Storage(_) => "storage",
        }
    }
}

/// Serialized as `{ detail: "...", kind: "..." }` for HTTP clients.
impl Serialize for GuidanceError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("GuidanceError", 2)?;
        s.serialize_field("detail", &self.to_string())?;
        s.serialize_field("kind", self.kind())?;
        s.end()
    }
}
