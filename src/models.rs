use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSheetReq {
    /// Missing and empty are both rejected by the registrar.
    #[serde(default)]
    #[schema(example = "1029384756")]
    pub cedula: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "success": true,
        "message": "Asistencia registrada.",
        "nombre": "Ana Pérez"
    })
)]
pub struct UpdateSheetResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
}

impl UpdateSheetResponse {
    pub fn registered(nombre: String) -> Self {
        Self {
            success: true,
            message: "Asistencia registrada.".to_string(),
            nombre: Some(nombre),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            nombre: None,
        }
    }
}
