use crate::error::AppError;
use crate::models::IotMessage;
use crate::services::IotService;
use crate::utils::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use log::warn;
use serde_json::json;

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Station push endpoint. The body is verified against its HMAC signature
/// before it is parsed.
#[utoipa::path(
    post,
    path = "/internal/stations/data",
    tag = "iot",
    request_body(content = String, description = "Signed station message: {\"type\": \"full\" | \"returned\" | \"status\", \"data\": {...}}", content_type = "application/json"),
    params(
        ("X-Signature" = String, Header, description = "Hex HMAC-SHA256 of \"{timestamp}.{body}\""),
        ("X-Timestamp" = i64, Header, description = "Unix seconds the message was signed at")
    ),
    responses(
        (status = 200, description = "Message applied", body = IotSyncResponse),
        (status = 400, description = "Malformed message"),
        (status = 401, description = "Bad signature or stale timestamp"),
        (status = 404, description = "Unknown station or power bank")
    )
)]
pub async fn station_data(
    iot_service: web::Data<IotService>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    if let Err(e) = iot_service.verify_request(
        &body,
        header(&req, SIGNATURE_HEADER),
        header(&req, TIMESTAMP_HEADER),
    ) {
        warn!("Rejected station message: {e}");
        return Ok(e.error_response());
    }

    let message: IotMessage = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(e) => {
            return Ok(AppError::ValidationError(format!("Malformed station message: {e}"))
                .error_response());
        }
    };

    match iot_service.process_message(message).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn iot_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/internal/stations/data", web::post().to(station_data));
}
