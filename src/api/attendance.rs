use crate::{
    error::RegistrationError,
    models::{UpdateSheetReq, UpdateSheetResponse},
    registrar::Registrar,
};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use tracing::{error, instrument};

/// Register attendance for today's event day
#[utoipa::path(
    post,
    path = "/update_sheet",
    request_body = UpdateSheetReq,
    responses(
        (status = 200, description = "Attendance registered", body = UpdateSheetResponse, example = json!({
            "success": true,
            "message": "Asistencia registrada.",
            "nombre": "Ana Pérez"
        })),
        (status = 400, description = "Invalid cédula, not an event day, or already registered", body = UpdateSheetResponse, example = json!({
            "success": false,
            "message": "La cédula debe contener solo números"
        })),
        (status = 404, description = "Cédula not found", body = UpdateSheetResponse, example = json!({
            "success": false,
            "message": "Cédula no encontrada."
        })),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Attendance sheet unreachable or internal error", body = UpdateSheetResponse)
    ),
    tag = "Attendance"
)]
#[instrument(name = "update_sheet", skip(registrar, payload))]
pub async fn update_sheet(
    registrar: web::Data<Registrar>,
    payload: web::Json<UpdateSheetReq>,
) -> Result<HttpResponse, RegistrationError> {
    let result = registrar
        .register_attendance(payload.cedula.as_deref(), Utc::now())
        .await;

    match result {
        Ok(registration) => {
            Ok(HttpResponse::Ok().json(UpdateSheetResponse::registered(registration.nombre)))
        }
        Err(e) => {
            match &e {
                RegistrationError::StoreUnavailable(source) => {
                    error!(error = %source, "Attendance sheet unavailable");
                }
                RegistrationError::UnexpectedFailure(source) => {
                    error!(error = %source, "Attendance registration failed");
                }
                _ => {}
            }
            Err(e)
        }
    }
}
