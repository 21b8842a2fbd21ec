use crate::models::{UpdateSheetReq, UpdateSheetResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Registration API",
        version = "1.0.0",
        description = r#"
## Attendance registration

Marks an attendee present for the current event day in the shared
attendance spreadsheet, stamping the local time of registration.

- One `POST /update_sheet` per arrival, keyed by the attendee's **cédula**
- Each event day has its own status and time columns
- Re-submitting on the same day is rejected, nothing is overwritten

### Response Format
Every response is `{ "success": bool, "message": string, "nombre"?: string }`.
"#,
    ),
    paths(crate::api::attendance::update_sheet),
    components(schemas(UpdateSheetReq, UpdateSheetResponse)),
    tags(
        (name = "Attendance", description = "Attendance registration APIs"),
    )
)]
pub struct ApiDoc;
