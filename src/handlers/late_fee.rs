use crate::models::*;
use crate::services::LateFeeService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/admin/late-fee-configs",
    tag = "late-fee",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All late fee configurations", body = [LateFeeConfigResponse]),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_configs(late_fee_service: web::Data<LateFeeService>) -> Result<HttpResponse> {
    match late_fee_service.list_configs().await {
        Ok(configs) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": configs
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/late-fee-configs",
    tag = "late-fee",
    request_body = CreateLateFeeConfigRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Configuration created (inactive)", body = LateFeeConfigResponse),
        (status = 400, description = "Invalid parameters")
    )
)]
pub async fn create_config(
    late_fee_service: web::Data<LateFeeService>,
    request: web::Json<CreateLateFeeConfigRequest>,
) -> Result<HttpResponse> {
    match late_fee_service.create_config(request.into_inner()).await {
        Ok(config) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": config
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/late-fee-configs/active",
    tag = "late-fee",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Configuration currently applied to overdue rentals", body = LateFeeConfigResponse)
    )
)]
pub async fn active_config(late_fee_service: web::Data<LateFeeService>) -> Result<HttpResponse> {
    match late_fee_service.active_config().await {
        Ok(config) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": config
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/late-fee-configs/{id}",
    tag = "late-fee",
    params(
        ("id" = i64, Path, description = "Configuration id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Configuration", body = LateFeeConfigResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_config(
    late_fee_service: web::Data<LateFeeService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match late_fee_service.get_config(path.into_inner()).await {
        Ok(config) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": config
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/late-fee-configs/{id}",
    tag = "late-fee",
    request_body = UpdateLateFeeConfigRequest,
    params(
        ("id" = i64, Path, description = "Configuration id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Configuration updated", body = LateFeeConfigResponse),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_config(
    late_fee_service: web::Data<LateFeeService>,
    path: web::Path<i64>,
    request: web::Json<UpdateLateFeeConfigRequest>,
) -> Result<HttpResponse> {
    match late_fee_service
        .update_config(path.into_inner(), request.into_inner())
        .await
    {
        Ok(config) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": config
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/late-fee-configs/{id}",
    tag = "late-fee",
    params(
        ("id" = i64, Path, description = "Configuration id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Configuration deleted"),
        (status = 400, description = "The active configuration cannot be deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_config(
    late_fee_service: web::Data<LateFeeService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match late_fee_service.delete_config(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Late fee configuration deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/late-fee-configs/{id}/activate",
    tag = "late-fee",
    params(
        ("id" = i64, Path, description = "Configuration id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Configuration is now the only active one", body = LateFeeConfigResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn activate_config(
    late_fee_service: web::Data<LateFeeService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match late_fee_service.activate_config(path.into_inner()).await {
        Ok(config) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": config
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/late-fee-configs/{id}/preview",
    tag = "late-fee",
    request_body = LateFeePreviewRequest,
    params(
        ("id" = i64, Path, description = "Configuration id, 0 for the built-in default")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Fee the configuration would charge", body = LateFeePreviewResponse),
        (status = 404, description = "Not found")
    )
)]
pub async fn preview_config(
    late_fee_service: web::Data<LateFeeService>,
    path: web::Path<i64>,
    request: web::Json<LateFeePreviewRequest>,
) -> Result<HttpResponse> {
    match late_fee_service.preview(path.into_inner(), &request).await {
        Ok(preview) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": preview
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Mounted inside the `/admin` scope.
pub fn late_fee_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/late-fee-configs")
            .route("", web::get().to(list_configs))
            .route("", web::post().to(create_config))
            .route("/active", web::get().to(active_config))
            .route("/{id}", web::get().to(get_config))
            .route("/{id}", web::put().to(update_config))
            .route("/{id}", web::delete().to(delete_config))
            .route("/{id}/activate", web::post().to(activate_config))
            .route("/{id}/preview", web::post().to(preview_config)),
    );
}
