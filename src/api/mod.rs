use tracing::warn;

use crate::auth::auth::Session;
use crate::error::ApiError;
use crate::lifecycle::store::StoreError;
use crate::utils::board_cache::BoardCache;

pub mod absence;
pub mod board;
pub mod leave_balance;

/// Maps an upstream result for a handler. A rejected token tears the
/// session's board down before the 401 goes out.
pub(crate) async fn settle<T>(
    result: Result<T, StoreError>,
    boards: &BoardCache,
    session: &Session,
) -> Result<T, ApiError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if matches!(err, StoreError::Unauthorized) {
                teardown(boards, session).await;
            }
            Err(ApiError::from(err))
        }
    }
}

pub(crate) async fn teardown(boards: &BoardCache, session: &Session) {
    warn!(user_id = %session.user_id, "Upstream rejected session, evicting board");
    boards.evict(session).await;
}

/// Reloads the caller's board after a status change made outside the board.
pub(crate) async fn refresh_cached_board(boards: &BoardCache, session: &Session) {
    if let Some(board) = boards.existing(session).await {
        if let Err(e) = board.refresh().await {
            warn!(error = %e, "Board refresh after status change failed");
            if matches!(e, StoreError::Unauthorized) {
                teardown(boards, session).await;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use crate::auth::jwt::issue_test_token;
    use crate::client::upstream::Upstream;
    use crate::config::Config;
    use crate::lifecycle::store::{AbsenceStore, LeaveBalanceStore};
    use crate::lifecycle::test_support::RecordingStore;
    use crate::model::{id::Id, role::Role};
    use crate::models::Claims;
    use crate::auth::auth::Session;
    use crate::utils::board_cache::BoardCache;

    pub(crate) const SECRET: &str = "test-secret";

    pub(crate) struct FakeUpstream(pub RecordingStore);

    impl Upstream for FakeUpstream {
        fn absences(&self, _: &Session) -> Arc<dyn AbsenceStore> {
            Arc::new(self.0.clone())
        }

        fn balances(&self, _: &Session) -> Arc<dyn LeaveBalanceStore> {
            Arc::new(self.0.clone())
        }
    }

    pub(crate) fn config() -> Config {
        Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
            "JWT_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .expect("test config")
    }

    pub(crate) fn boards() -> BoardCache {
        BoardCache::new(100, Duration::from_secs(60))
    }

    pub(crate) fn bearer(user_id: &str, role: Role) -> (&'static str, String) {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as usize
            + 600;
        let token = issue_test_token(
            &Claims {
                sub: Id::new(user_id),
                role,
                exp,
                name: None,
            },
            SECRET,
        );
        ("Authorization", format!("Bearer {token}"))
    }

    /// Builds the protected API (no rate limiter) over a recording store.
    macro_rules! test_app {
        ($store:expr, $boards:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::new($crate::api::testing::config()))
                    .app_data(actix_web::web::Data::from(std::sync::Arc::new(
                        $crate::api::testing::FakeUpstream($store.clone()),
                    )
                        as std::sync::Arc<dyn $crate::client::upstream::Upstream>))
                    .app_data(actix_web::web::Data::new($boards.clone()))
                    .service(
                        actix_web::web::scope("/api")
                            .wrap(actix_web::middleware::from_fn(
                                $crate::auth::middleware::auth_middleware,
                            ))
                            .service($crate::routes::logout_resource())
                            .configure($crate::routes::api_services),
                    ),
            )
            .await
        };
    }

    pub(crate) use test_app;
}
