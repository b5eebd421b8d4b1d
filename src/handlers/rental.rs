use crate::middlewares::current_user;
use crate::models::*;
use crate::services::RentalService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/rentals/start",
    tag = "rental",
    request_body = StartRentalRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Rental created and awaiting dispense", body = RentalResponse),
        (status = 400, description = "Station not rentable or no power bank available"),
        (status = 402, description = "Insufficient wallet balance"),
        (status = 409, description = "User already has an open rental")
    )
)]
pub async fn start_rental(
    rental_service: web::Data<RentalService>,
    req: HttpRequest,
    request: web::Json<StartRentalRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match rental_service.start_rental(user.id, request.into_inner()).await {
        Ok(rental) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": rental
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/rentals",
    tag = "rental",
    params(RentalListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rental history of the current user")
    )
)]
pub async fn list_rentals(
    rental_service: web::Data<RentalService>,
    req: HttpRequest,
    query: web::Query<RentalListQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match rental_service.list_rentals(user.id, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/rentals/active",
    tag = "rental",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Open rental of the current user, or null", body = RentalResponse)
    )
)]
pub async fn active_rental(
    rental_service: web::Data<RentalService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match rental_service.active_rental(user.id).await {
        Ok(rental) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rental
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/rentals/{id}",
    tag = "rental",
    params(
        ("id" = i64, Path, description = "Rental id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rental detail", body = RentalResponse),
        (status = 404, description = "Rental not found")
    )
)]
pub async fn rental_detail(
    rental_service: web::Data<RentalService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match rental_service.rental_detail(user.id, path.into_inner()).await {
        Ok(rental) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rental
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/rentals/{id}/cancel",
    tag = "rental",
    params(
        ("id" = i64, Path, description = "Rental id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Rental cancelled and refunded", body = RentalResponse),
        (status = 400, description = "Only pending rentals can be cancelled"),
        (status = 404, description = "Rental not found")
    )
)]
pub async fn cancel_rental(
    rental_service: web::Data<RentalService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match rental_service.cancel_rental(user.id, path.into_inner()).await {
        Ok(rental) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rental,
            "message": "Rental cancelled"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/rentals/{id}/pay-late-fee",
    tag = "rental",
    params(
        ("id" = i64, Path, description = "Rental id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Outstanding late fee settled", body = RentalResponse),
        (status = 400, description = "Nothing to pay"),
        (status = 402, description = "Insufficient wallet balance")
    )
)]
pub async fn pay_late_fee(
    rental_service: web::Data<RentalService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(u) => u,
        Err(e) => return Ok(e.error_response()),
    };

    match rental_service.pay_late_fee(user.id, path.into_inner()).await {
        Ok(rental) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rental,
            "message": "Late fee paid"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn rental_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rentals")
            .route("", web::get().to(list_rentals))
            .route("/start", web::post().to(start_rental))
            .route("/active", web::get().to(active_rental))
            .route("/{id}", web::get().to(rental_detail))
            .route("/{id}/cancel", web::post().to(cancel_rental))
            .route("/{id}/pay-late-fee", web::post().to(pay_late_fee)),
    );
}
