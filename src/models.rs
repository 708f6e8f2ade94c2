use serde::{Deserialize, Serialize};

use crate::model::{id::Id, role::Role};

/// Claims carried by the upstream-issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account id of the signed-in user
    #[serde(alias = "id", alias = "user_id")]
    pub sub: Id,
    pub role: Role,
    pub exp: usize,
    #[serde(default)]
    pub name: Option<String>,
}

/// Every upstream success body is wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Upstream error bodies.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
