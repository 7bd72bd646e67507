//! In-memory [`BoardApi`] for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::{ApiError, BoardApi, ExportEntry, ExportedBoard, MetadataResponse, RawBoard, SaveResponse};

#[derive(Default)]
pub struct MockApi {
    pub boards: Mutex<HashMap<String, Value>>,
    pub saves: Mutex<Vec<RawBoard>>,
    pub metadata: Mutex<Option<MetadataResponse>>,
    pub metadata_requests: Mutex<Vec<String>>,
    pub bookmarks: Mutex<Vec<(String, String)>>,
    pub reject_saves: AtomicBool,
    pub fail_saves: AtomicBool,
}

impl MockApi {
    pub fn with_board(id: &str, data: Value) -> Self {
        let api = Self::default();
        api.boards.lock().unwrap().insert(id.to_owned(), data);
        api
    }

    pub fn empty_board(id: &str) -> Self {
        Self::with_board(id, json!({"title": "Mock board", "items": []}))
    }

    pub fn set_metadata(&self, source: &str, data: Value) {
        *self.metadata.lock().unwrap() = Some(MetadataResponse { source: source.into(), data });
    }

    pub fn saves(&self) -> Vec<RawBoard> {
        self.saves.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }
}

#[async_trait]
impl BoardApi for MockApi {
    async fn get_board(&self, id: &str) -> Result<RawBoard, ApiError> {
        let boards = self.boards.lock().unwrap();
        if id == "create" {
            return Ok(RawBoard { board_id: "SEEDED".into(), data: json!({"items": []}) });
        }
        boards
            .get(id)
            .map(|data| RawBoard { board_id: id.to_owned(), data: data.clone() })
            .ok_or(ApiError::Status { status: 500, body: "Failed to load board".into() })
    }

    async fn save_board(&self, board: &RawBoard) -> Result<SaveResponse, ApiError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ApiError::Request("connection reset".into()));
        }
        self.saves.lock().unwrap().push(board.clone());
        Ok(SaveResponse { success: !self.reject_saves.load(Ordering::SeqCst) })
    }

    async fn export_boards(&self, boards: &[ExportEntry]) -> Result<Vec<ExportedBoard>, ApiError> {
        let stored = self.boards.lock().unwrap();
        Ok(boards
            .iter()
            .filter_map(|entry| {
                stored.get(&entry.id).map(|data| ExportedBoard {
                    board_id: entry.id.clone(),
                    title: entry.title.clone(),
                    data: data.clone(),
                })
            })
            .collect())
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MetadataResponse, ApiError> {
        self.metadata_requests.lock().unwrap().push(url.to_owned());
        self.metadata.lock().unwrap().clone().ok_or(ApiError::Status { status: 502, body: String::new() })
    }

    async fn add_bookmark(&self, board_id: &str, link: &str) -> Result<Value, ApiError> {
        self.bookmarks.lock().unwrap().push((board_id.to_owned(), link.to_owned()));
        Ok(json!({"success": true}))
    }
}
