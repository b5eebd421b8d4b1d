use crate::middlewares::current_user;
use crate::models::*;
use crate::services::ReferralService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/referrals/validate/{code}",
    tag = "referral",
    params(
        ("code" = String, Path, description = "Referral code to check")
    ),
    responses(
        (status = 200, description = "Code belongs to an active user", body = ReferralCodeInfo),
        (status = 400, description = "Unknown code")
    )
)]
pub async fn validate_code(
    referral_service: web::Data<ReferralService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match referral_service.validate_code(&path).await {
        Ok(info) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": info
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/referrals/my",
    tag = "referral",
    params(ReferralListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Users invited by the current user")
    )
)]
pub async fn my_referrals(
    referral_service: web::Data<ReferralService>,
    req: HttpRequest,
    query: web::Query<ReferralListQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match referral_service.my_referrals(user.id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/referrals/stats",
    tag = "referral",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Referral counters for the current user", body = ReferralStatsResponse)
    )
)]
pub async fn referral_stats(
    referral_service: web::Data<ReferralService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match referral_service.referral_stats(user.id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn referral_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/referrals")
            .route("/validate/{code}", web::get().to(validate_code))
            .route("/my", web::get().to(my_referrals))
            .route("/stats", web::get().to(referral_stats)),
    );
}
