use crate::domain::ports::{BrowserLauncher, BrowserSession};
use crate::utils::error::{PortalError, Result};

/// Holds at most one live browser session.
///
/// The session is launched on first use. When an operation fails with a
/// session-fatal error the slot closes and forgets it, so the next caller
/// gets a fresh one. Exclusive use is enforced by `&mut self`.
pub struct BrowserSlot {
    launcher: Box<dyn BrowserLauncher>,
    session: Option<Box<dyn BrowserSession>>,
    launches: u32,
}

impl BrowserSlot {
    pub fn new<L: BrowserLauncher + 'static>(launcher: L) -> Self {
        Self {
            launcher: Box::new(launcher),
            session: None,
            launches: 0,
        }
    }

    /// 取得目前的 session，沒有的話啟動一個
    pub async fn session(&mut self) -> Result<&mut (dyn BrowserSession + 'static)> {
        if self.session.is_none() {
            tracing::info!("🌐 Launching browser session");
            let session = self.launcher.launch().await?;
            self.launches += 1;
            self.session = Some(session);
        }

        self.session
            .as_deref_mut()
            .ok_or_else(|| PortalError::browser("browser session unavailable"))
    }

    /// Passes `result` through, discarding the session first when the error
    /// means the session can no longer be trusted.
    pub async fn guard<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_session_fatal() {
                tracing::warn!("♻️ Discarding browser session after: {}", e);
                self.discard().await;
            }
        }
        result
    }

    /// Closes and drops the current session; close failures are only logged.
    pub async fn discard(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::debug!("Browser session close failed: {}", e);
            }
        }
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        match self.session.take() {
            Some(mut session) => session.close().await,
            None => Ok(()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Number of sessions launched over the slot's lifetime.
    pub fn launches(&self) -> u32 {
        self.launches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    struct NullSession {
        closed: Arc<AtomicU32>,
    }

    #[async_trait]
    impl BrowserSession for NullSession {
        async fn navigate(&mut self, _url: &Url) -> Result<()> {
            Ok(())
        }
        async fn wait_for_element(&mut self, _selector: &str, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }
        async fn attribute(&mut self, _selector: &str, _name: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn cookie(&mut self, _name: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn page_source(&mut self) -> Result<String> {
            Ok(String::new())
        }
        async fn close(&mut self) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NullLauncher {
        closed: Arc<AtomicU32>,
    }

    #[async_trait]
    impl BrowserLauncher for NullLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
            Ok(Box::new(NullSession {
                closed: self.closed.clone(),
            }))
        }
    }

    #[tokio::test]
    async fn test_session_is_launched_lazily_and_reused() {
        let closed = Arc::new(AtomicU32::new(0));
        let mut slot = BrowserSlot::new(NullLauncher { closed });
        assert!(!slot.is_active());

        slot.session().await.unwrap();
        slot.session().await.unwrap();
        assert_eq!(slot.launches(), 1);
        assert!(slot.is_active());
    }

    #[tokio::test]
    async fn test_fatal_error_replaces_session() {
        let closed = Arc::new(AtomicU32::new(0));
        let mut slot = BrowserSlot::new(NullLauncher {
            closed: closed.clone(),
        });
        slot.session().await.unwrap();

        let result: Result<()> = slot.guard(Err(PortalError::browser("tab crashed"))).await;
        assert!(result.is_err());
        assert!(!slot.is_active());
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        slot.session().await.unwrap();
        assert_eq!(slot.launches(), 2);
    }

    #[tokio::test]
    async fn test_non_fatal_error_keeps_session() {
        let closed = Arc::new(AtomicU32::new(0));
        let mut slot = BrowserSlot::new(NullLauncher { closed });
        slot.session().await.unwrap();

        let result: Result<()> = slot
            .guard(Err(PortalError::NotFound {
                what: "case".to_string(),
            }))
            .await;
        assert!(result.is_err());
        assert!(slot.is_active());
    }
}
