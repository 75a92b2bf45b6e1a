//! Typed rendering outcomes.
//!
//! Rendering problems are ordinary business outcomes, not errors: callers
//! receive a [`RenderResult`] and never need exception handling to tell
//! credit exhaustion apart from a transport failure.

/// Details of a failed rendering call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderFailure {
    /// The call failed due to insufficient credits.
    pub out_of_credits: bool,

    /// An unknown error occurred.
    pub other_error: bool,

    /// Human/machine-readable failure detail.
    pub status_message: Option<String>,
}

/// Outcome of a rendering call: the document data, or failure details.
#[derive(Debug)]
pub enum RenderResult<T> {
    /// The call succeeded; holds the rendered document.
    Success(T),

    /// The call failed; holds the failure details.
    Failure(RenderFailure),
}

impl<T> RenderResult<T> {
    /// A successful result carrying the rendered document.
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self::Success(data)
    }

    /// A credit-exhaustion failure naming the affected API key.
    #[must_use]
    pub fn out_of_credits(api_key: &str) -> Self {
        Self::Failure(RenderFailure {
            out_of_credits: true,
            other_error: false,
            status_message: Some(json_status(&format!(
                "No credit left for organization owning API key '{api_key}'"
            ))),
        })
    }

    /// A generic failure with the given status message.
    #[must_use]
    pub fn other_error(status_message: impl Into<String>) -> Self {
        Self::Failure(RenderFailure {
            out_of_credits: false,
            other_error: true,
            status_message: Some(status_message.into()),
        })
    }

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the call failed due to insufficient credits.
    #[must_use]
    pub const fn is_out_of_credits(&self) -> bool {
        matches!(
            self,
            Self::Failure(RenderFailure {
                out_of_credits: true,
                ..
            })
        )
    }

    /// Whether the call failed for any other reason.
    #[must_use]
    pub const fn is_other_error(&self) -> bool {
        matches!(
            self,
            Self::Failure(RenderFailure {
                other_error: true,
                ..
            })
        )
    }

    /// The rendered document, when successful.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// Consume the result and return the rendered document, when successful.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// The failure details, when failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&RenderFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// The failure status message, when one was recorded.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.failure().and_then(|f| f.status_message.as_deref())
    }
}

/// Build a machine-readable `{"message": ...}` status JSON.
#[must_use]
pub fn json_status(message: &str) -> String {
    serde_json::json!({ "message": message }).to_string()
}
