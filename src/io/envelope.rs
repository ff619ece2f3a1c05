//! JSON output envelope for `--json` commands.
//!
//! Every machine-readable response has the same outer shape so scripts can
//! check `status` and `code` without knowing the payload type.

use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Schema version for this envelope format.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Message type for stream discrimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Result,
    Error,
}

/// Operation outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Operation succeeded with results
    Success,
    /// Lookup succeeded but found nothing
    NotFound,
    /// Run finished but some input records were skipped
    PartialSuccess,
    /// Operation failed
    Error,
}

/// Machine-readable result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Ok,
    NotFound,
    InvalidInput,
    ClusteringError,
    WriteError,
    ConfigError,
}

impl ResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::ClusteringError => "CLUSTERING_ERROR",
            Self::WriteError => "WRITE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl From<&ClusterError> for ResultCode {
    fn from(error: &ClusterError) -> Self {
        match error {
            ClusterError::InputRead { .. }
            | ClusterError::InputFormat { .. }
            | ClusterError::NoValidRecords { .. }
            | ClusterError::ResultsLoad { .. } => Self::InvalidInput,
            ClusterError::InvalidClusterCount { .. }
            | ClusterError::DimensionMismatch { .. }
            | ClusterError::Assignment { .. } => Self::ClusteringError,
            ClusterError::FileWrite { .. } | ClusterError::Serialization { .. } => {
                Self::WriteError
            }
            ClusterError::ClusterNotFound { .. } => Self::NotFound,
            ClusterError::ConfigError { .. } => Self::ConfigError,
        }
    }
}

/// Kind of payload carried in `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    RunReport,
    ClusterSummaries,
    ClusterSummary,
}

/// Unified JSON output envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T = serde_json::Value> {
    #[serde(rename = "type")]
    pub message_type: MessageType,

    pub status: Status,

    pub code: ResultCode,

    /// Process exit code the CLI uses for this response
    pub exit_code: u8,

    /// Human-readable message
    pub message: String,

    /// Result payload (null on error)
    pub data: Option<T>,

    /// Error details (absent on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,

    pub meta: Meta,
}

/// Error details with suggestions and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Stable error code from [`ClusterError::status_code`]
    pub status_code: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub schema_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<PayloadKind>,

    /// Number of items in data (records, clusters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            payload: None,
            count: None,
            duration_ms: None,
        }
    }
}

impl<T> Envelope<T> {
    /// Create a success envelope with data.
    pub fn success(data: T) -> Self {
        Self {
            message_type: MessageType::Result,
            status: Status::Success,
            code: ResultCode::Ok,
            exit_code: 0,
            message: "Operation completed successfully".to_string(),
            data: Some(data),
            error: None,
            meta: Meta::default(),
        }
    }

    /// Create a success envelope for a run that skipped some input.
    pub fn partial(data: T, message: impl Into<String>) -> Self {
        Self {
            status: Status::PartialSuccess,
            message: message.into(),
            ..Self::success(data)
        }
    }

    /// Create an error envelope from a pipeline error.
    pub fn from_error(error: &ClusterError) -> Self {
        let code = ResultCode::from(error);
        Self {
            message_type: MessageType::Error,
            status: if code == ResultCode::NotFound {
                Status::NotFound
            } else {
                Status::Error
            },
            code,
            exit_code: 1,
            message: error.to_string(),
            data: None,
            error: Some(ErrorDetails {
                status_code: error.status_code().to_string(),
                suggestions: error
                    .recovery_suggestions()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            }),
            meta: Meta::default(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_payload(mut self, payload: PayloadKind) -> Self {
        self.meta.payload = Some(payload);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.meta.count = Some(count);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.meta.duration_ms = Some(duration_ms);
        self
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error>
    where
        T: Serialize,
    {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let envelope = Envelope::success(vec![2, 4])
            .with_payload(PayloadKind::RunReport)
            .with_count(6)
            .with_message("Clustered 6 records");

        assert_eq!(envelope.message_type, MessageType::Result);
        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.code, ResultCode::Ok);
        assert_eq!(envelope.exit_code, 0);
        assert_eq!(envelope.meta.count, Some(6));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_partial_keeps_success_code() {
        let envelope = Envelope::partial((), "2 records skipped");
        assert_eq!(envelope.status, Status::PartialSuccess);
        assert_eq!(envelope.code, ResultCode::Ok);
        assert_eq!(envelope.exit_code, 0);
        assert_eq!(envelope.message, "2 records skipped");
    }

    #[test]
    fn test_error_envelope_carries_suggestions() {
        let error = ClusterError::InvalidClusterCount { k: 8, records: 3 };
        let envelope: Envelope<()> = Envelope::from_error(&error);

        assert_eq!(envelope.message_type, MessageType::Error);
        assert_eq!(envelope.status, Status::Error);
        assert_eq!(envelope.code, ResultCode::ClusteringError);
        assert_eq!(envelope.exit_code, 1);
        let details = envelope.error.unwrap();
        assert_eq!(details.status_code, "INVALID_CLUSTER_COUNT");
        assert!(!details.suggestions.is_empty());
    }

    #[test]
    fn test_missing_cluster_is_not_found() {
        let error = ClusterError::ClusterNotFound { id: 9, available: 5 };
        let envelope: Envelope<()> = Envelope::from_error(&error);
        assert_eq!(envelope.status, Status::NotFound);
        assert_eq!(envelope.code.as_str(), "NOT_FOUND");
    }

    #[test]
    fn test_json_serialization() {
        let json = Envelope::success(vec!["a"])
            .with_payload(PayloadKind::ClusterSummaries)
            .to_json()
            .unwrap();
        assert!(json.contains("\"type\": \"result\""));
        assert!(json.contains("\"status\": \"success\""));
        assert!(json.contains("\"code\": \"OK\""));
        assert!(json.contains("\"payload\": \"cluster_summaries\""));
        assert!(json.contains("\"schema_version\": \"1.0.0\""));
        assert!(!json.contains("\"error\""));
    }
}
