// Round history stores: append-only JSON lines on disk, or in memory.

use crate::domain::{HistoryError, HistoryStore, RoundRecord};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Hands records to a background writer so `save` never blocks a tick.
pub struct JsonlHistoryStore {
    tx: mpsc::Sender<RoundRecord>,
}

impl JsonlHistoryStore {
    /// Spawns the writer task; must be called inside a tokio runtime.
    pub fn spawn(path: PathBuf, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(history_writer(path, rx));
        Self { tx }
    }
}

impl HistoryStore for JsonlHistoryStore {
    fn save(&self, record: RoundRecord) -> Result<(), HistoryError> {
        self.tx.try_send(record).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => HistoryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => HistoryError::WriterStopped,
        })
    }
}

async fn history_writer(path: PathBuf, mut rx: mpsc::Receiver<RoundRecord>) {
    let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
        Ok(file) => file,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to open history file");
            return;
        }
    };

    while let Some(record) = rx.recv().await {
        let mut line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                error!(round_id = %record.id, error = ?e, "failed to serialize round record");
                continue;
            }
        };
        line.push('\n');

        if let Err(e) = file.write_all(line.as_bytes()).await {
            warn!(round_id = %record.id, error = %e, "failed to append round record");
            continue;
        }
        if let Err(e) = file.flush().await {
            warn!(error = %e, "failed to flush history file");
        }
        debug!(round_id = %record.id, "round record persisted");
    }
    debug!("history channel closed; writer exiting");
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<RoundRecord>>,
}

impl InMemoryHistoryStore {
    pub fn records(&self) -> Vec<RoundRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn save(&self, record: RoundRecord) -> Result<(), HistoryError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RoundResult;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn record(id: &str) -> RoundRecord {
        RoundRecord {
            id: id.to_string(),
            game_type: "reach".to_string(),
            start_time: 1_700_000_000_000,
            result: RoundResult::Win,
            winner_id: Some(7),
            player_count: 2,
            scores: BTreeMap::from([(7, 3), (8, 1)]),
        }
    }

    #[tokio::test]
    async fn jsonl_store_appends_one_line_per_round() {
        let path = std::env::temp_dir().join(format!("rounds-{}.jsonl", uuid::Uuid::new_v4()));
        let store = JsonlHistoryStore::spawn(path.clone(), 8);

        store.save(record("minigame-a")).expect("queued");
        store.save(record("minigame-b")).expect("queued");

        let mut lines = Vec::new();
        for _ in 0..100 {
            let contents = tokio::fs::read_to_string(&path).await.unwrap_or_default();
            lines = contents.lines().map(str::to_string).collect::<Vec<_>>();
            if lines.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(&lines[0]).expect("json line");
        assert_eq!(first["id"], "minigame-a");
        assert_eq!(first["type"], "reach");
        assert_eq!(first["result"], "win");
        assert_eq!(first["winner_id"], 7);
        assert_eq!(first["scores"]["7"], 3);
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn jsonl_store_reports_full_queue_and_stopped_writer() {
        let (tx, rx) = mpsc::channel(1);
        let store = JsonlHistoryStore { tx };

        assert_eq!(store.save(record("minigame-a")), Ok(()));
        assert_eq!(store.save(record("minigame-b")), Err(HistoryError::QueueFull));

        drop(rx);
        assert_eq!(
            store.save(record("minigame-c")),
            Err(HistoryError::WriterStopped)
        );
    }

    #[test]
    fn in_memory_store_keeps_records() {
        let store = InMemoryHistoryStore::default();
        store.save(record("minigame-a")).expect("saved");
        assert_eq!(store.records().len(), 1);
    }
}
