use crate::models::*;
use crate::services::StationService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/stations",
    tag = "station",
    params(StationListQuery),
    responses(
        (status = 200, description = "Paginated station list")
    )
)]
pub async fn list_stations(
    station_service: web::Data<StationService>,
    query: web::Query<StationListQuery>,
) -> Result<HttpResponse> {
    match station_service.list_stations(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stations/{serial}",
    tag = "station",
    params(
        ("serial" = String, Path, description = "Station serial number")
    ),
    responses(
        (status = 200, description = "Station with slots and rentable power banks", body = StationDetailResponse),
        (status = 404, description = "Unknown station")
    )
)]
pub async fn station_detail(
    station_service: web::Data<StationService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match station_service.station_detail(&path).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/packages",
    tag = "station",
    responses(
        (status = 200, description = "Active rental packages", body = [RentalPackageResponse])
    )
)]
pub async fn list_packages(station_service: web::Data<StationService>) -> Result<HttpResponse> {
    match station_service.list_packages().await {
        Ok(packages) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": packages
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn station_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stations")
            .route("", web::get().to(list_stations))
            .route("/{serial}", web::get().to(station_detail)),
    )
    .route("/packages", web::get().to(list_packages));
}
