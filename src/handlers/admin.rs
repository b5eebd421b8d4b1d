use crate::handlers::late_fee::late_fee_config;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{
    AdminService, PointsService, ReferralService, RentalService, StationService, UserService,
};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Fleet and revenue counters", body = DashboardResponse),
        (status = 403, description = "Staff only")
    )
)]
pub async fn dashboard(admin_service: web::Data<AdminService>) -> Result<HttpResponse> {
    match admin_service.dashboard().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(UserListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated user list")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    match user_service.list_users(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/status",
    tag = "admin",
    request_body = SetUserStatusRequest,
    params(
        ("id" = i64, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Status changed", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_user_status(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    path: web::Path<i64>,
    request: web::Json<SetUserStatusRequest>,
) -> Result<HttpResponse> {
    let actor = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match user_service
        .set_status(actor.id, path.into_inner(), request.into_inner())
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/points/adjust",
    tag = "admin",
    request_body = AdjustPointsRequest,
    params(
        ("id" = i64, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Adjustment recorded", body = PointsTransactionResponse),
        (status = 400, description = "Zero adjustment or missing reason")
    )
)]
pub async fn adjust_points(
    points_service: web::Data<PointsService>,
    path: web::Path<i64>,
    request: web::Json<AdjustPointsRequest>,
) -> Result<HttpResponse> {
    match points_service
        .admin_adjust(path.into_inner(), request.points, &request.reason)
        .await
    {
        Ok(entry) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": entry
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/stations/{serial}/maintenance",
    tag = "admin",
    request_body = SetMaintenanceRequest,
    params(
        ("serial" = String, Path, description = "Station serial number")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Maintenance flag updated", body = StationResponse),
        (status = 404, description = "Unknown station")
    )
)]
pub async fn set_station_maintenance(
    station_service: web::Data<StationService>,
    path: web::Path<String>,
    request: web::Json<SetMaintenanceRequest>,
) -> Result<HttpResponse> {
    match station_service
        .set_maintenance(&path, request.is_maintenance)
        .await
    {
        Ok(station) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": station
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/rentals",
    tag = "admin",
    params(RentalListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated rentals of all users")
    )
)]
pub async fn list_rentals(
    rental_service: web::Data<RentalService>,
    query: web::Query<RentalListQuery>,
) -> Result<HttpResponse> {
    match rental_service.list_all_rentals(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/referrals",
    tag = "admin",
    params(ReferralListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Paginated referrals")
    )
)]
pub async fn list_referrals(
    referral_service: web::Data<ReferralService>,
    query: web::Query<ReferralListQuery>,
) -> Result<HttpResponse> {
    match referral_service.list_referrals(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/referrals/{id}/complete",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Referral id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Referral completed and both sides rewarded", body = ReferralResponse),
        (status = 400, description = "Referral already settled or expired"),
        (status = 404, description = "Referral not found")
    )
)]
pub async fn complete_referral(
    referral_service: web::Data<ReferralService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match referral_service.complete_referral(path.into_inner()).await {
        Ok(referral) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": referral
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/dashboard", web::get().to(dashboard))
            .route("/users", web::get().to(list_users))
            .route("/users/{id}/status", web::put().to(set_user_status))
            .route("/users/{id}/points/adjust", web::post().to(adjust_points))
            .route(
                "/stations/{serial}/maintenance",
                web::put().to(set_station_maintenance),
            )
            .route("/rentals", web::get().to(list_rentals))
            .route("/referrals", web::get().to(list_referrals))
            .route("/referrals/{id}/complete", web::post().to(complete_referral))
            .configure(late_fee_config),
    );
}
