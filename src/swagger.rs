use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    LateFeeType, PaymentMethod, PointsSource, PointsTransactionType, PowerBankStatus,
    ReferralStatus, RentalStatus, SlotStatus, StationStatus, TransactionStatus, TransactionType,
    UserStatus,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::station::list_stations,
        handlers::station::station_detail,
        handlers::station::list_packages,
        handlers::rental::start_rental,
        handlers::rental::list_rentals,
        handlers::rental::active_rental,
        handlers::rental::rental_detail,
        handlers::rental::cancel_rental,
        handlers::rental::pay_late_fee,
        handlers::wallet::get_wallet,
        handlers::wallet::list_transactions,
        handlers::wallet::create_topup,
        handlers::points::get_summary,
        handlers::points::get_history,
        handlers::points::redeem_points,
        handlers::referral::validate_code,
        handlers::referral::my_referrals,
        handlers::referral::referral_stats,
        handlers::iot::station_data,
        handlers::admin::dashboard,
        handlers::admin::list_users,
        handlers::admin::set_user_status,
        handlers::admin::adjust_points,
        handlers::admin::set_station_maintenance,
        handlers::admin::list_rentals,
        handlers::admin::list_referrals,
        handlers::admin::complete_referral,
        handlers::late_fee::list_configs,
        handlers::late_fee::create_config,
        handlers::late_fee::active_config,
        handlers::late_fee::get_config,
        handlers::late_fee::update_config,
        handlers::late_fee::delete_config,
        handlers::late_fee::activate_config,
        handlers::late_fee::preview_config,
    ),
    components(
        schemas(
            UserStatus,
            StationStatus,
            SlotStatus,
            PowerBankStatus,
            RentalStatus,
            TransactionType,
            TransactionStatus,
            PaymentMethod,
            PointsTransactionType,
            PointsSource,
            ReferralStatus,
            LateFeeType,
            ApiError,
            RegisterRequest,
            LoginRequest,
            RefreshTokenRequest,
            UpdateProfileRequest,
            UserResponse,
            AuthResponse,
            SetUserStatusRequest,
            StationResponse,
            SlotResponse,
            PowerBankResponse,
            StationDetailResponse,
            RentalPackageResponse,
            SetMaintenanceRequest,
            StartRentalRequest,
            RentalResponse,
            WalletResponse,
            TransactionResponse,
            TopupRequest,
            PaymentWebhookPayload,
            PointsSummaryResponse,
            PointsTransactionResponse,
            AdjustPointsRequest,
            RedeemPointsRequest,
            ReferralCodeInfo,
            ReferralResponse,
            ReferralStatsResponse,
            CreateLateFeeConfigRequest,
            UpdateLateFeeConfigRequest,
            LateFeeConfigResponse,
            LateFeePreviewRequest,
            LateFeePreviewResponse,
            DeviceInfo,
            SlotReport,
            PowerBankReport,
            FullSyncData,
            ReturnedData,
            StatusData,
            IotSyncResponse,
            DashboardResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "user", description = "Profile of the signed-in user"),
        (name = "station", description = "Stations, slots and rental packages"),
        (name = "rental", description = "Power bank rentals"),
        (name = "wallet", description = "Wallet balance and top-ups"),
        (name = "points", description = "Loyalty points"),
        (name = "referral", description = "Referral codes and rewards"),
        (name = "iot", description = "Station hardware sync"),
        (name = "admin", description = "Staff operations"),
        (name = "late-fee", description = "Late fee configuration"),
    ),
    info(
        title = "ChargeGhar Backend API",
        version = "1.0.0",
        description = "Power bank rental REST API",
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/auth/register"));
        assert!(paths.contains_key("/rentals/{id}/pay-late-fee"));
        assert!(paths.contains_key("/internal/stations/data"));
        assert!(paths.contains_key("/points/redeem"));
        assert!(paths.contains_key("/admin/late-fee-configs/{id}/activate"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
