use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use chargeghar_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml()
        .map_err(|e| startup_error("Failed to load configuration", e))?;

    let pool = create_pool(&config.database)
        .await
        .map_err(|e| startup_error("Failed to create database connection pool", e))?;

    run_migrations(&pool)
        .await
        .map_err(|e| startup_error("Failed to run database migrations", e))?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    if config.iot.secret.is_empty() {
        log::warn!("IoT secret is empty, station messages will be rejected");
    }
    if config.payments.webhook_secret.is_empty() {
        log::warn!("Payment webhook secret is empty, gateway callbacks will be rejected");
    }

    let rewards = config.rewards.clone();
    let points_service = PointsService::new(pool.clone());
    let wallet_service = WalletService::new(pool.clone(), points_service.clone(), rewards.clone());
    let referral_service =
        ReferralService::new(pool.clone(), points_service.clone(), rewards.clone());
    let late_fee_service = LateFeeService::new(pool.clone());
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        wallet_service.clone(),
        points_service.clone(),
        referral_service.clone(),
        rewards.clone(),
    );
    let user_service = UserService::new(pool.clone());
    let station_service = StationService::new(pool.clone());
    let rental_service = RentalService::new(
        pool.clone(),
        wallet_service.clone(),
        points_service.clone(),
        referral_service.clone(),
        late_fee_service.clone(),
        rewards,
    );
    let iot_service = IotService::new(pool.clone(), rental_service.clone(), config.iot.clone());
    let admin_service = AdminService::new(pool.clone());

    tasks::spawn_all(
        rental_service.clone(),
        referral_service.clone(),
        config.tasks.clone(),
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let payments = config.payments.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(web::Data::new(payments.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(station_service.clone()))
            .app_data(web::Data::new(rental_service.clone()))
            .app_data(web::Data::new(wallet_service.clone()))
            .app_data(web::Data::new(points_service.clone()))
            .app_data(web::Data::new(referral_service.clone()))
            .app_data(web::Data::new(late_fee_service.clone()))
            .app_data(web::Data::new(iot_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::station_config)
                    .configure(handlers::rental_config)
                    .configure(handlers::wallet_config)
                    .configure(handlers::points_config)
                    .configure(handlers::referral_config)
                    .configure(handlers::iot_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
