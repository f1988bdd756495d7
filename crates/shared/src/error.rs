use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOperation {
    Register,
    FetchQuestionnaire,
    SaveProgress,
    LoadProgress,
    Submit,
    HealthCheck,
}

impl ServiceOperation {
    pub fn fallback_message(self) -> &'static str {
        match self {
            ServiceOperation::Register => "Registration failed",
            ServiceOperation::FetchQuestionnaire => "Failed to fetch questionnaire",
            ServiceOperation::SaveProgress => "Failed to save progress",
            ServiceOperation::LoadProgress => "Failed to load progress",
            ServiceOperation::Submit => "Failed to submit questionnaire",
            ServiceOperation::HealthCheck => "Health check failed",
        }
    }

    /// Whether a rejected response body may carry a user-facing `error` message.
    pub fn reads_error_body(self) -> bool {
        !matches!(self, ServiceOperation::FetchQuestionnaire)
    }
}

/// Failure body returned by the remote service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }

    pub fn message_or(self, operation: ServiceOperation) -> String {
        self.error
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| operation.fallback_message().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Rejected {
        operation: ServiceOperation,
        status: u16,
        message: String,
    },
    #[error("{}: {detail}", .operation.fallback_message())]
    Transport {
        operation: ServiceOperation,
        detail: String,
    },
    #[error("{}: malformed response ({detail})", .operation.fallback_message())]
    Decode {
        operation: ServiceOperation,
        detail: String,
    },
}

impl ServiceError {
    pub fn rejected(operation: ServiceOperation, status: u16, body: ErrorBody) -> Self {
        Self::Rejected {
            operation,
            status,
            message: body.message_or(operation),
        }
    }
}
