use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize, Serializer};

/// Uniform response envelope wrapped around every API reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn error(code: u16, message: impl Into<String>, data: Option<T>) -> Self {
        Self { code, message: message.into(), data, request_id: uuid::Uuid::new_v4().to_string() }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// A log file as listed by the viewer.
#[derive(Debug, Clone, Serialize)]
pub struct LogFile {
    pub filename: String,
    pub size: u64,
    pub size_display: String,
    #[serde(serialize_with = "serialize_local_time")]
    pub modified_at: DateTime<Local>,
}

fn serialize_local_time<S: Serializer>(t: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&t.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// One page of a log file's lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub lines: Vec<String>,
    pub total_lines: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Items pushed to a live tail subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TailEvent {
    /// A complete line appended after the subscription started.
    Line { line: String },
    /// The file shrank or was replaced; the cursor moved to the new end.
    Reset { offset: u64 },
    /// Terminal failure; no further events follow.
    Error { message: String },
}

/// Formats a byte count the way the log viewer displays it (`1.50 KB`).
pub fn format_file_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}
