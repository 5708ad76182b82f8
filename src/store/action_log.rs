use std::{
    path::PathBuf,
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::{
    debug,
    info,
    warn,
};
use uuid::Uuid;

use crate::{
    core::FiszkiError,
    persistence::{
        load_json,
        save_json_async,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Generate,
    Add,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate { input_text_length: usize, cards_count: usize },
    Add { flashcard_id: Uuid },
    Delete { flashcard_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action_type: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_text_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_flashcard_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ActionLogEntry {
    pub fn new(user_id: Uuid, action: Action) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4(),
            user_id,
            action_type: ActionType::Generate,
            input_text_length: None,
            cards_count: None,
            related_flashcard_id: None,
            created_at: Utc::now(),
        };
        match action {
            Action::Generate { input_text_length, cards_count } => {
                entry.input_text_length = Some(input_text_length);
                entry.cards_count = Some(cards_count);
            }
            Action::Add { flashcard_id } => {
                entry.action_type = ActionType::Add;
                entry.related_flashcard_id = Some(flashcard_id);
            }
            Action::Delete { flashcard_id } => {
                entry.action_type = ActionType::Delete;
                entry.related_flashcard_id = Some(flashcard_id);
            }
        }
        entry
    }
}

/// Audit trail of user actions.
#[async_trait]
pub trait ActionLog: Send + Sync {
    async fn record(&self, action: Action) -> Result<(), FiszkiError>;
}

/// Records `action`, logging and dropping any failure so the caller's outcome never depends on it.
pub async fn record_action(log: &dyn ActionLog, action: Action) {
    if let Err(e) = log.record(action).await {
        warn!(error = %e, ?action, "Failed to record action");
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ActionLogData {
    entries: Vec<ActionLogEntry>,
}

/// Action log for one user kept in a JSON file.
pub struct JsonActionLog {
    user_id: Uuid,
    file_path: PathBuf,
    data: Mutex<ActionLogData>,
    write_gate: tokio::sync::Mutex<()>,
}

impl JsonActionLog {
    pub fn open(user_id: Uuid, file_path: PathBuf) -> Result<Self, FiszkiError> {
        let data: ActionLogData = load_json(&file_path)?;
        info!(path = %file_path.display(), count = data.entries.len(), "Opened action log");
        Ok(Self {
            user_id,
            file_path,
            data: Mutex::new(data),
            write_gate: tokio::sync::Mutex::new(()),
        })
    }

    pub fn entries(&self) -> Vec<ActionLogEntry> {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).entries.clone()
    }
}

#[async_trait]
impl ActionLog for JsonActionLog {
    async fn record(&self, action: Action) -> Result<(), FiszkiError> {
        let entry = ActionLogEntry::new(self.user_id, action);
        let entry_id = entry.id;
        self.data.lock().unwrap_or_else(|e| e.into_inner()).entries.push(entry);

        // Snapshot under the gate so the newest state is always written last.
        let _gate = self.write_gate.lock().await;
        let snapshot = self.data.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Err(e) = save_json_async(&snapshot, &self.file_path).await {
            self.data
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .entries
                .retain(|entry| entry.id != entry_id);
            return Err(e);
        }

        debug!(?action, "Action recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[tokio::test]
    async fn test_entries_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action_logs.json");
        let user = Uuid::new_v4();
        let flashcard_id = Uuid::new_v4();

        let log = JsonActionLog::open(user, path.clone()).unwrap();
        log.record(Action::Generate { input_text_length: 7, cards_count: 6 }).await.unwrap();
        log.record(Action::Add { flashcard_id }).await.unwrap();
        drop(log);

        let entries = JsonActionLog::open(user, path.clone()).unwrap().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action_type, ActionType::Generate);
        assert_eq!(entries[0].input_text_length, Some(7));
        assert_eq!(entries[0].cards_count, Some(6));
        assert_eq!(entries[1].action_type, ActionType::Add);
        assert_eq!(entries[1].related_flashcard_id, Some(flashcard_id));
        assert!(entries.iter().all(|e| e.user_id == user));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"action_type\": \"GENERATE\""));
        assert!(!raw.contains("\"related_flashcard_id\": null"));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_and_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action_logs.json");
        let log = JsonActionLog::open(Uuid::new_v4(), path.clone()).unwrap();
        fs::create_dir(&path).unwrap();

        let action = Action::Delete { flashcard_id: Uuid::new_v4() };
        assert!(log.record(action).await.is_err());
        assert!(log.entries().is_empty());

        // The swallowing wrapper returns normally.
        record_action(&log, action).await;
        assert!(log.entries().is_empty());
    }
}
