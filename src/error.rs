use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::UpdateSheetResponse;
use crate::store::StoreError;

/// Everything a registration attempt can end in besides success. The
/// `Display` text is the user-facing message.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("El día {} no es un día válido del evento.", .0.format("%d/%m/%Y"))]
    NotEventDay(NaiveDate),

    #[error("Cédula no encontrada.")]
    NotFound,

    #[error("La asistencia de hoy ya fue registrada.")]
    AlreadyRegistered,

    #[error("No fue posible conectar con la hoja de asistencia. Intente de nuevo más tarde.")]
    StoreUnavailable(#[source] StoreError),

    #[error("Error interno del servidor.")]
    UnexpectedFailure(#[source] StoreError),
}

pub const MISSING_CEDULA: &str = "Cédula no proporcionada.";
pub const NON_NUMERIC_CEDULA: &str = "La cédula debe contener solo números";
pub const MALFORMED_BODY: &str = "Solicitud inválida.";

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        if e.is_connectivity() {
            RegistrationError::StoreUnavailable(e)
        } else {
            RegistrationError::UnexpectedFailure(e)
        }
    }
}

impl ResponseError for RegistrationError {
    fn status_code(&self) -> StatusCode {
        match self {
            RegistrationError::InvalidInput(_)
            | RegistrationError::NotEventDay(_)
            | RegistrationError::AlreadyRegistered => StatusCode::BAD_REQUEST,
            RegistrationError::NotFound => StatusCode::NOT_FOUND,
            RegistrationError::StoreUnavailable(_) | RegistrationError::UnexpectedFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(UpdateSheetResponse::failed(self.to_string()))
    }
}
