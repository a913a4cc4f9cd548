use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use reqwest::StatusCode;

use super::{connection::Document, quiz::AppData};
use crate::error::StoreError;

/// In-process stand-in for the remote document.
#[derive(Default)]
pub(crate) struct MemoryDocument {
    data: Mutex<AppData>,
    writes: AtomicUsize,
    failing: bool,
}

impl MemoryDocument {
    pub(crate) fn with(data: AppData) -> Self {
        Self {
            data: Mutex::new(data),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn unavailable() -> StoreError {
        StoreError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "unavailable".into(),
        }
    }
}

impl Document for MemoryDocument {
    async fn fetch(&self) -> Result<AppData, StoreError> {
        if self.failing {
            return Err(Self::unavailable());
        }
        Ok(self.data.lock().unwrap().clone())
    }

    async fn write(&self, data: &AppData) -> Result<(), StoreError> {
        if self.failing {
            return Err(Self::unavailable());
        }
        *self.data.lock().unwrap() = data.clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
