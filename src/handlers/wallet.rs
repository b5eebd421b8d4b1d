use crate::config::PaymentsConfig;
use crate::error::AppError;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::WalletService;
use crate::utils::{SIGNATURE_HEADER, TIMESTAMP_HEADER, verify_signed_payload};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use log::{info, warn};
use serde_json::json;

/// Signed gateway callbacks older than this are refused.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[utoipa::path(
    get,
    path = "/wallet",
    tag = "wallet",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Wallet balance", body = WalletResponse)
    )
)]
pub async fn get_wallet(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match wallet_service.get_wallet(user.id).await {
        Ok(wallet) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": wallet
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/wallet/transactions",
    tag = "wallet",
    params(TransactionListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated money movements")
    )
)]
pub async fn list_transactions(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    query: web::Query<TransactionListQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match wallet_service.list_transactions(user.id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/wallet/topup",
    tag = "wallet",
    request_body = TopupRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Pending top-up created", body = TransactionResponse),
        (status = 400, description = "Amount out of range or unsupported gateway")
    )
)]
pub async fn create_topup(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    request: web::Json<TopupRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match wallet_service.create_topup(user.id, request.into_inner()).await {
        Ok(transaction) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Gateway callback settling a PENDING top-up.
pub async fn payment_webhook(
    req: HttpRequest,
    body: web::Bytes,
    path: web::Path<String>,
    payments: web::Data<PaymentsConfig>,
    wallet_service: web::Data<WalletService>,
) -> Result<HttpResponse> {
    let gateway = path.into_inner();

    if let Err(e) = verify_signed_payload(
        &payments.webhook_secret,
        &body,
        header(&req, SIGNATURE_HEADER),
        header(&req, TIMESTAMP_HEADER),
        WEBHOOK_TOLERANCE_SECS,
        Utc::now().timestamp(),
    ) {
        warn!("Rejected payment webhook from {gateway}: {e}");
        return Ok(e.error_response());
    }

    let payload: PaymentWebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            return Ok(AppError::ValidationError(format!("Malformed webhook body: {e}"))
                .error_response());
        }
    };

    let success = match payload.status.to_ascii_uppercase().as_str() {
        "SUCCESS" => true,
        "FAILED" => false,
        other => {
            return Ok(
                AppError::ValidationError(format!("Unknown payment status: {other}"))
                    .error_response(),
            );
        }
    };

    info!(
        "Payment webhook received: gateway={}, transaction_id={}, status={}",
        gateway, payload.transaction_id, payload.status
    );

    match wallet_service
        .confirm_topup(
            &gateway,
            &payload.transaction_id,
            &payload.gateway_reference,
            success,
        )
        .await
    {
        Ok(transaction) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": transaction
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn wallet_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/wallet")
            .route("", web::get().to(get_wallet))
            .route("/transactions", web::get().to(list_transactions))
            .route("/topup", web::post().to(create_topup)),
    );
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/webhook/payments/{gateway}",
        web::post().to(payment_webhook),
    );
}
