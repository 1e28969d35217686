use crate::utils::error::{PortalError, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Shutdown signal plus optional deadline, threaded through every wait in
/// the export and lookup flows.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    shutdown: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// 不會被取消，也沒有期限
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_shutdown(shutdown: watch::Receiver<bool>) -> Self {
        Self {
            shutdown: Some(shutdown),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(PortalError::Cancelled {
                stage: stage.to_string(),
            });
        }
        if self.is_expired() {
            return Err(PortalError::Cancelled {
                stage: format!("{} (deadline exceeded)", stage),
            });
        }
        Ok(())
    }

    /// Resolves once shutdown is signalled or the deadline passes; pending
    /// forever otherwise. Meant to be raced against a long wait with `select!`.
    pub async fn cancelled(&self, stage: &str) -> PortalError {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let shutdown = async {
            match &self.shutdown {
                Some(rx) => {
                    let mut rx = rx.clone();
                    loop {
                        if *rx.borrow_and_update() {
                            break;
                        }
                        if rx.changed().await.is_err() {
                            std::future::pending::<()>().await;
                        }
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = shutdown => PortalError::Cancelled { stage: stage.to_string() },
            _ = deadline => PortalError::Cancelled {
                stage: format!("{} (deadline exceeded)", stage),
            },
        }
    }

    /// Sleeps for `duration`, waking early on shutdown and never past the deadline.
    pub async fn sleep(&self, duration: Duration, stage: &str) -> Result<()> {
        self.check(stage)?;

        let mut wake = Instant::now() + duration;
        if let Some(deadline) = self.deadline {
            wake = wake.min(deadline);
        }

        match &self.shutdown {
            Some(rx) => {
                let mut rx = rx.clone();
                tokio::select! {
                    _ = tokio::time::sleep_until(wake) => {}
                    changed = rx.changed() => {
                        // sender gone: nobody can cancel us any more
                        if changed.is_err() {
                            tokio::time::sleep_until(wake).await;
                        }
                    }
                }
            }
            None => tokio::time::sleep_until(wake).await,
        }

        self.check(stage)
    }
}
