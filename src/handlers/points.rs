use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{PointsService, WalletService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/points",
    tag = "points",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Points balance and lifetime total", body = PointsSummaryResponse)
    )
)]
pub async fn get_summary(
    points_service: web::Data<PointsService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match points_service.get_summary(user.id).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": summary
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/points/history",
    tag = "points",
    params(PointsHistoryQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated points ledger")
    )
)]
pub async fn get_history(
    points_service: web::Data<PointsService>,
    req: HttpRequest,
    query: web::Query<PointsHistoryQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match points_service.get_history(user.id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/points/redeem",
    tag = "points",
    request_body = RedeemPointsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Points spent and wallet credited", body = TransactionResponse),
        (status = 400, description = "Not a valid amount or not enough points")
    )
)]
pub async fn redeem_points(
    wallet_service: web::Data<WalletService>,
    req: HttpRequest,
    request: web::Json<RedeemPointsRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match wallet_service.redeem_points(user.id, request.points).await {
        Ok(credit) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": credit,
            "message": "Points redeemed"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn points_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/points")
            .route("", web::get().to(get_summary))
            .route("/history", web::get().to(get_history))
            .route("/redeem", web::post().to(redeem_points)),
    );
}
