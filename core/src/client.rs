// core/src/client.rs
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::observer::RequestObserver;
use crate::session::Session;

/// Metrikk-uttrekk oppå en innlogget [`Session`].
///
/// Tilstandsløs mellom kall: alt av tilstand (cookies, bruker-id) bor i
/// sesjonen. Aksessorene ligger i `intraday.rs` og `activity.rs`.
#[derive(Debug, Clone)]
pub struct Client {
    session: Session,
}

impl Client {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn login(email: &str, password: &str, config: &ClientConfig) -> Result<Self> {
        Session::login(email, password, config).map(Self::new)
    }

    pub fn login_with_observer(
        email: &str,
        password: &str,
        config: &ClientConfig,
        observer: Arc<dyn RequestObserver>,
    ) -> Result<Self> {
        Session::login_with_observer(email, password, config, observer).map(Self::new)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn user_id(&self) -> &str {
        self.session.user_id()
    }

    pub fn into_session(self) -> Session {
        self.session
    }
}
