use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const DEFAULT_NOTICE_CAPACITY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Stable identity of the board; keys the persisted ledger record.
    pub board_key: String,
    /// SQLite file for the ledger. `None` keeps it in memory.
    pub ledger_path: Option<PathBuf>,
    /// Maximum number of undismissed notices kept.
    pub notice_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            board_key: String::new(),
            ledger_path: None,
            notice_capacity: DEFAULT_NOTICE_CAPACITY,
        }
    }
}

impl BoardConfig {
    pub fn new(board_key: impl Into<String>) -> Self {
        Self {
            board_key: board_key.into(),
            ..Self::default()
        }
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.board_key.trim().is_empty() {
            return Err(EngineError::Config("board_key must not be empty".into()));
        }
        if self.notice_capacity == 0 {
            return Err(EngineError::Config("notice_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = BoardConfig::from_json_str(r#"{"board_key":"pipeline:acme"}"#).unwrap();
        assert_eq!(config.board_key, "pipeline:acme");
        assert_eq!(config.ledger_path, None);
        assert_eq!(config.notice_capacity, DEFAULT_NOTICE_CAPACITY);
    }

    #[test]
    fn rejects_blank_board_key() {
        assert!(matches!(BoardConfig::from_json_str("{}"), Err(EngineError::Config(_))));
        assert!(matches!(
            BoardConfig::from_json_str(r#"{"board_key":"  "}"#),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn rejects_zero_notice_capacity() {
        let raw = r#"{"board_key":"b","notice_capacity":0}"#;
        assert!(matches!(BoardConfig::from_json_str(raw), Err(EngineError::Config(_))));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        std::fs::write(&path, r#"{"board_key":"b","ledger_path":"/tmp/ledger.db","notice_capacity":3}"#)
            .unwrap();

        let config = BoardConfig::from_path(&path).unwrap();
        assert_eq!(config.ledger_path, Some(PathBuf::from("/tmp/ledger.db")));
        assert_eq!(config.notice_capacity, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BoardConfig::from_path(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
