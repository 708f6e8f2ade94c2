use crate::api::absence::{AbsenceDetails, ProcessComments};
use crate::api::board::DragResult;
use crate::lifecycle::form::{AbsenceForm, FormPreview, FormValidation};
use crate::lifecycle::policy::AllowedActions;
use crate::model::absence::{AbsenceRequest, AbsenceStatus, AbsenceType, ProcessAction};
use crate::model::board::{BoardView, ColumnView, DragEvent};
use crate::model::leave_balance::{BalanceUpdate, DayCounts, LeaveBalance};
use crate::model::role::Role;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Absence Board API",
        version = "0.1.0",
        description = r#"
## Absence request lifecycle

Backend-for-frontend for the absence Kanban board and request forms.

### Key Features
- **Board**: requests partitioned into pending, approved, rejected and cancelled columns;
  drag-and-drop moves are applied optimistically and rolled back by a full reload
- **Requests**: balance-aware validation, live preview, create, edit, approve, reject, cancel
- **Leave balances**: own, team and per-employee balances; admin allotment updates

### Security
Every endpoint requires the **JWT Bearer** token issued by the absence service.
Status changes follow the request state machine: only managers and admins approve or reject;
the owner, the assigned manager or an admin may cancel.
"#,
    ),
    paths(
        crate::api::board::get_board,
        crate::api::board::refresh_board,
        crate::api::board::drag,

        crate::api::absence::get_absence,
        crate::api::absence::preview_absence,
        crate::api::absence::create_absence,
        crate::api::absence::update_absence,
        crate::api::absence::approve_absence,
        crate::api::absence::reject_absence,
        crate::api::absence::cancel_absence,

        crate::api::leave_balance::my_balance,
        crate::api::leave_balance::team_balances,
        crate::api::leave_balance::employee_balance,
        crate::api::leave_balance::update_balance
    ),
    components(
        schemas(
            AbsenceRequest,
            AbsenceStatus,
            AbsenceType,
            ProcessAction,
            Role,
            BoardView,
            ColumnView,
            DragEvent,
            DragResult,
            AbsenceDetails,
            AllowedActions,
            ProcessComments,
            AbsenceForm,
            FormPreview,
            FormValidation,
            LeaveBalance,
            DayCounts,
            BalanceUpdate
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Board", description = "Kanban board APIs"),
        (name = "Absence", description = "Absence request APIs"),
        (name = "Leave balance", description = "Leave balance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
