// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ferry_core::{FerryError, HostLiveness, LivenessNotice};

/// Host liveness that records announcements. Clones share state.
#[derive(Clone, Default)]
pub struct RecordingLiveness {
    announced: Arc<Mutex<Vec<LivenessNotice>>>,
    withdrawals: Arc<Mutex<usize>>,
}

impl RecordingLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn announcements(&self) -> Vec<LivenessNotice> {
        self.announced.lock().await.clone()
    }

    pub async fn withdrawals(&self) -> usize {
        *self.withdrawals.lock().await
    }
}

#[async_trait]
impl HostLiveness for RecordingLiveness {
    async fn announce(&self, notice: &LivenessNotice) -> Result<(), FerryError> {
        self.announced.lock().await.push(notice.clone());
        Ok(())
    }

    async fn withdraw(&self) -> Result<(), FerryError> {
        *self.withdrawals.lock().await += 1;
        Ok(())
    }
}
