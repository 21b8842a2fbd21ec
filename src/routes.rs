use crate::{
    api::attendance,
    error::MALFORMED_BODY,
    models::UpdateSheetResponse,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, web};
use anyhow::{Context, Result};
use tracing::debug;

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer-IP limiter allowing `requests_per_min` with the same burst.
pub fn build_limiter(requests_per_min: u32) -> Result<LimiterConfig> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;

    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limiter settings")
}

/// Malformed bodies get the same JSON shape as every other failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected request body");
        let resp = HttpResponse::BadRequest().json(UpdateSheetResponse::failed(MALFORMED_BODY));
        InternalError::from_response(err, resp).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, limiter: &LimiterConfig) {
    cfg.app_data(json_config()).service(
        web::resource("/update_sheet")
            .wrap(Governor::new(limiter))
            .route(web::post().to(attendance::update_sheet)),
    );
}
