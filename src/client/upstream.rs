use std::sync::Arc;

use crate::auth::auth::Session;
use crate::client::api::AbsenceApi;
use crate::lifecycle::store::{AbsenceStore, LeaveBalanceStore};

/// Hands out upstream stores bound to one caller's session.
pub trait Upstream: Send + Sync {
    fn absences(&self, session: &Session) -> Arc<dyn AbsenceStore>;
    fn balances(&self, session: &Session) -> Arc<dyn LeaveBalanceStore>;
}

/// Production upstream: one shared connection pool, one client per session token.
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn api(&self, session: &Session) -> Arc<AbsenceApi> {
        Arc::new(AbsenceApi::with_client(
            self.client.clone(),
            &self.base_url,
            &session.token,
        ))
    }
}

impl Upstream for HttpUpstream {
    fn absences(&self, session: &Session) -> Arc<dyn AbsenceStore> {
        self.api(session)
    }

    fn balances(&self, session: &Session) -> Arc<dyn LeaveBalanceStore> {
        self.api(session)
    }
}
