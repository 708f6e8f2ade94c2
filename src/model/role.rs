use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    /// Managers and admins may process requests and drive the board.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}
