use crate::model::{id::Id, role::Role};
use crate::models::Claims;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// The signed-in actor for one request.
///
/// Built by `auth_middleware` from a verified bearer token and torn down on
/// logout or when the upstream answers 401. Policy checks and board moves take
/// it explicitly instead of reading ambient state.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Id,
    pub name: Option<String>,
    pub role: Role,
    /// Forwarded upstream as `Authorization: Bearer`.
    pub token: String,
}

impl Session {
    pub fn new(user_id: Id, role: Role, token: impl Into<String>) -> Self {
        Self {
            user_id,
            name: None,
            role,
            token: token.into(),
        }
    }

    pub fn from_claims(claims: Claims, token: &str) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            role: claims.role,
            token: token.to_string(),
        }
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> actix_web::Result<()> {
        if self.role.is_privileged() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager/Admin only"))
        }
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Session>() {
            Some(session) => ready(Ok(session.clone())),
            None => ready(Err(ErrorUnauthorized("Missing session"))),
        }
    }
}
