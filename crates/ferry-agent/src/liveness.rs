// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host liveness for a resident process supervised by systemd.
//!
//! Announcing sends `READY=1` plus the notice text as `STATUS=`, which keeps a
//! `Type=notify` unit from being reaped as stuck. Outside systemd the calls
//! are no-ops apart from logging.

use async_trait::async_trait;
use tracing::{debug, info};

use ferry_core::{FerryError, HostLiveness, LivenessNotice};

#[derive(Debug, Clone, Default)]
pub struct SystemdLiveness;

impl SystemdLiveness {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn notify(states: &[sd_notify::NotifyState<'_>]) -> Result<(), FerryError> {
    sd_notify::notify(false, states).map_err(|e| FerryError::Internal(format!("sd_notify failed: {e}")))
}

#[async_trait]
impl HostLiveness for SystemdLiveness {
    async fn announce(&self, notice: &LivenessNotice) -> Result<(), FerryError> {
        info!(
            channel = notice.channel.as_str(),
            title = notice.title.as_str(),
            text = notice.text.as_str(),
            "liveness notice announced"
        );
        #[cfg(unix)]
        {
            let status = format!("{}: {}", notice.title, notice.text);
            notify(&[
                sd_notify::NotifyState::Ready,
                sd_notify::NotifyState::Status(&status),
            ])?;
        }
        Ok(())
    }

    async fn withdraw(&self) -> Result<(), FerryError> {
        debug!("liveness notice withdrawn");
        #[cfg(unix)]
        notify(&[sd_notify::NotifyState::Stopping])?;
        Ok(())
    }
}
