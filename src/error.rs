use std::path::PathBuf;

use serde::Serialize;

/// Coarse error taxonomy shared by every tool. Transports and tests match on
/// this rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    NotFound,
    OutOfBounds,
    InvalidInput,
    IoFailure,
    RollbackFailure,
}

/// Structured error type for the tool engine. Every variant names the
/// offending resource so the message can be shown to the caller verbatim.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(tag = "code", content = "detail")]
pub enum AppError {
    #[error("Invalid project path: {reason}")]
    InvalidProject { path: PathBuf, reason: String },

    #[error("Not a valid RPG Maker MZ project (game.rmmzproject not found): {}", path.display())]
    ProjectFileNotFound { path: PathBuf },

    #[error("Map file not found: {}", crate::paths::map_file_name(*map_id))]
    MapNotFound { map_id: u32 },

    #[error("Failed to read map file {}: {reason}", crate::paths::map_file_name(*map_id))]
    MapCorrupt { map_id: u32, reason: String },

    #[error("Event {event_id} not found in Map {map_id}")]
    EventNotFound { map_id: u32, event_id: u32 },

    #[error("Page {page_index} not found in Event {event_id} (Map {map_id})")]
    PageNotFound {
        map_id: u32,
        event_id: u32,
        page_index: usize,
    },

    #[error("Data file not found: {filename}")]
    DataFileNotFound { filename: String },

    #[error("Failed to parse data file {filename}: {reason}")]
    DataFileCorrupt { filename: String, reason: String },

    #[error("Plugin file not found: {filename}")]
    PluginFileNotFound { filename: String },

    #[error("Failed to read plugin file {filename}: {reason}")]
    PluginFileCorrupt { filename: String, reason: String },

    #[error("Invalid path (path traversal detected): {path}")]
    PathTraversal { path: String },

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    #[error("{what} index {index} out of bounds (length {len})")]
    IndexOutOfBounds {
        what: String,
        index: i64,
        len: usize,
    },

    #[error("No backup found for {file}")]
    NoBackupFound { file: String },

    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Operation failed ({cause}) and rollback also failed: {rollback}")]
    RollbackFailed { cause: Box<AppError>, rollback: String },
}

impl AppError {
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn io(context: impl std::fmt::Display, err: &std::io::Error) -> Self {
        AppError::Io {
            message: format!("{context}: {err}"),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MapNotFound { .. }
            | AppError::EventNotFound { .. }
            | AppError::PageNotFound { .. }
            | AppError::DataFileNotFound { .. }
            | AppError::PluginFileNotFound { .. }
            | AppError::NoBackupFound { .. } => ErrorKind::NotFound,
            AppError::IndexOutOfBounds { .. } => ErrorKind::OutOfBounds,
            AppError::InvalidProject { .. }
            | AppError::ProjectFileNotFound { .. }
            | AppError::MapCorrupt { .. }
            | AppError::DataFileCorrupt { .. }
            | AppError::PluginFileCorrupt { .. }
            | AppError::PathTraversal { .. }
            | AppError::InvalidInput { .. }
            | AppError::UnknownTool { .. } => ErrorKind::InvalidInput,
            AppError::Io { .. } => ErrorKind::IoFailure,
            AppError::RollbackFailed { .. } => ErrorKind::RollbackFailure,
        }
    }

    /// Stable short code, compatible with the codes earlier clients already parse.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidProject { .. } => "E1000",
            AppError::ProjectFileNotFound { .. } => "E1002",
            AppError::MapNotFound { .. } => "E1100",
            AppError::MapCorrupt { .. } => "E1101",
            AppError::EventNotFound { .. } => "E1103",
            AppError::PageNotFound { .. } => "E1104",
            AppError::DataFileNotFound { .. } => "E1200",
            AppError::DataFileCorrupt { .. } => "E1203",
            AppError::PathTraversal { .. } => "E1301",
            AppError::PluginFileNotFound { .. } => "E1400",
            AppError::PluginFileCorrupt { .. } => "E1401",
            AppError::InvalidInput { .. } => "E1501",
            AppError::IndexOutOfBounds { .. } => "E1502",
            AppError::NoBackupFound { .. } => "E1600",
            AppError::UnknownTool { .. } => "E1601",
            AppError::Io { .. } => "E1602",
            AppError::RollbackFailed { .. } => "E1603",
        }
    }

    /// `[E1100] Map file not found: Map003.json`
    pub fn to_tool_message(&self) -> String {
        format!("[{}] {self}", self.code())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io {
            message: e.to_string(),
        }
    }
}

/// Allow converting AppError to String for transports that only carry text.
impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_tool_message()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_resource() {
        let e = AppError::MapNotFound { map_id: 3 };
        assert_eq!(e.to_string(), "Map file not found: Map003.json");
        assert_eq!(e.to_tool_message(), "[E1100] Map file not found: Map003.json");
        assert_eq!(e.kind(), ErrorKind::NotFound);

        let e = AppError::IndexOutOfBounds {
            what: "Command".into(),
            index: 7,
            len: 7,
        };
        assert_eq!(e.to_string(), "Command index 7 out of bounds (length 7)");
        assert_eq!(e.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn rollback_failure_carries_both_causes() {
        let e = AppError::RollbackFailed {
            cause: Box::new(AppError::Io {
                message: "disk full".into(),
            }),
            rollback: "permission denied".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("disk full"));
        assert!(msg.contains("permission denied"));
        assert_eq!(e.kind(), ErrorKind::RollbackFailure);
    }

    #[test]
    fn serializes_with_code_tag() {
        let json = serde_json::to_value(AppError::NoBackupFound {
            file: "Map001.json".into(),
        })
        .unwrap();
        assert_eq!(json["code"], "NoBackupFound");
        assert_eq!(json["detail"]["file"], "Map001.json");
    }
}
