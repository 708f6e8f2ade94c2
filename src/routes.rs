use crate::{
    api::{absence, board, leave_balance},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Resource, middleware::from_fn, web};

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);
    let logout_limiter = build_limiter(config.rate_logout_per_min);

    // Everything sits behind the bearer token
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(logout_resource().wrap(logout_limiter))
            .configure(api_services),
    );
}

pub fn logout_resource() -> Resource {
    web::resource("/session/logout").route(web::post().to(handlers::logout))
}

/// Protected endpoints without the scope middleware, so tests can mount them directly.
pub fn api_services(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::current_session)
        .service(
            web::scope("/board")
                // /board
                .service(web::resource("").route(web::get().to(board::get_board)))
                // /board/refresh
                .service(web::resource("/refresh").route(web::post().to(board::refresh_board)))
                // /board/drag
                .service(web::resource("/drag").route(web::post().to(board::drag))),
        )
        .service(
            web::scope("/absences")
                // /absences
                .service(web::resource("").route(web::post().to(absence::create_absence)))
                // /absences/preview
                .service(
                    web::resource("/preview").route(web::post().to(absence::preview_absence)),
                )
                // /absences/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(absence::get_absence))
                        .route(web::put().to(absence::update_absence))
                        .route(web::delete().to(absence::cancel_absence)),
                )
                // /absences/{id}/approve
                .service(
                    web::resource("/{id}/approve")
                        .route(web::post().to(absence::approve_absence)),
                )
                // /absences/{id}/reject
                .service(
                    web::resource("/{id}/reject").route(web::post().to(absence::reject_absence)),
                ),
        )
        .service(
            web::scope("/leave-balances")
                // /leave-balances/me
                .service(web::resource("/me").route(web::get().to(leave_balance::my_balance)))
                // /leave-balances/team
                .service(
                    web::resource("/team").route(web::get().to(leave_balance::team_balances)),
                )
                // /leave-balances/{employee_id}
                .service(
                    web::resource("/{employee_id}")
                        .route(web::get().to(leave_balance::employee_balance))
                        .route(web::put().to(leave_balance::update_balance)),
                ),
        );
}
