use crate::config::RewardsConfig;
use crate::entities::{PointsSource, UserStatus, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{PointsEntry, PointsService, ReferralService, WalletService};
use crate::utils::*;
use actix_web::http::StatusCode;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

const REFERRAL_CODE_ATTEMPTS: usize = 10;

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
    wallet_service: WalletService,
    points_service: PointsService,
    referral_service: ReferralService,
    rewards: RewardsConfig,
}

/// Login is refused for accounts that are not ACTIVE.
pub fn ensure_can_sign_in(status: UserStatus) -> AppResult<()> {
    match status {
        UserStatus::Active => Ok(()),
        UserStatus::Banned => Err(AppError::service("user_banned", "Account has been banned")
            .with_status(StatusCode::FORBIDDEN)),
        UserStatus::Inactive => Err(AppError::service("user_inactive", "Account is inactive")
            .with_status(StatusCode::FORBIDDEN)),
    }
}

pub fn validate_full_name(full_name: &str) -> AppResult<()> {
    let len = full_name.trim().chars().count();
    if !(2..=100).contains(&len) {
        return Err(AppError::ValidationError(
            "Full name must be between 2 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

/// Normalizes and validates an optional phone number.
pub fn normalize_phone(phone: Option<&str>) -> AppResult<Option<String>> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => {
            let formatted = format_np_phone(raw);
            validate_np_phone(&formatted)?;
            Ok(Some(formatted))
        }
        None => Ok(None),
    }
}

impl AuthService {
    pub fn new(
        pool: DatabaseConnection,
        jwt_service: JwtService,
        wallet_service: WalletService,
        points_service: PointsService,
        referral_service: ReferralService,
        rewards: RewardsConfig,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            wallet_service,
            points_service,
            referral_service,
            rewards,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();
        validate_email(&email)?;
        validate_password(&request.password)?;
        validate_full_name(&request.full_name)?;
        let phone = normalize_phone(request.phone.as_deref())?;

        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .count(&self.pool)
            .await?;
        if taken > 0 {
            return Err(
                AppError::service("email_taken", "Email is already registered")
                    .with_status(StatusCode::CONFLICT),
            );
        }

        let inviter = match request
            .referral_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(code) => Some(self.referral_service.find_inviter(code).await?),
            None => None,
        };

        let password_hash = hash_password(&request.password)?;

        let txn = self.pool.begin().await?;
        let referral_code = self.unique_referral_code(&txn).await?;
        let now = Utc::now();

        let user = users::ActiveModel {
            email: Set(email),
            phone: Set(phone),
            full_name: Set(request.full_name.trim().to_string()),
            password_hash: Set(password_hash),
            status: Set(UserStatus::Active),
            is_staff: Set(false),
            referral_code: Set(referral_code),
            referred_by: Set(inviter.as_ref().map(|i| i.id)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        self.wallet_service.ensure_wallet_tx(&txn, user.id).await?;
        self.points_service.ensure_account_tx(&txn, user.id).await?;

        if self.rewards.signup_bonus_points > 0 {
            self.points_service
                .award_points_tx(
                    &txn,
                    user.id,
                    self.rewards.signup_bonus_points,
                    PointsEntry::new(PointsSource::Signup, "Signup bonus"),
                )
                .await?;
        }

        if let Some(inviter) = &inviter {
            self.referral_service
                .create_referral_tx(&txn, inviter.id, user.id, &inviter.referral_code)
                .await?;
        }

        txn.commit().await?;

        log::info!(
            "User registered: id={}, referred_by={:?}",
            user.id,
            user.referred_by
        );
        self.issue_tokens(user)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }
        ensure_can_sign_in(user.status)?;

        let mut am = user.into_active_model();
        am.last_login_at = Set(Some(Utc::now()));
        let user = am.update(&self.pool).await?;

        self.issue_tokens(user)
    }

    /// New access token for a valid refresh token; the refresh token is kept.
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
        ensure_can_sign_in(user.status)?;

        let access_token = self
            .jwt_service
            .generate_access_token(user.id, user.is_staff)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, user.is_staff)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, user.is_staff)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    async fn unique_referral_code(&self, txn: &DatabaseTransaction) -> AppResult<String> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = generate_referral_code();
            let exists = users::Entity::find()
                .filter(users::Column::ReferralCode.eq(code.as_str()))
                .count(txn)
                .await?;
            if exists == 0 {
                return Ok(code);
            }
        }
        Err(AppError::InternalError(
            "Could not generate a unique referral code".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_status_rules() {
        assert!(ensure_can_sign_in(UserStatus::Active).is_ok());

        let banned = ensure_can_sign_in(UserStatus::Banned).unwrap_err();
        assert_eq!(banned.code(), "user_banned");
        assert_eq!(banned.status(), StatusCode::FORBIDDEN);

        let inactive = ensure_can_sign_in(UserStatus::Inactive).unwrap_err();
        assert_eq!(inactive.code(), "user_inactive");
    }

    #[test]
    fn test_full_name_length() {
        assert!(validate_full_name("Ram").is_ok());
        assert!(validate_full_name(" A ").is_err());
        assert!(validate_full_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            normalize_phone(Some("9812345678")).unwrap(),
            Some("+9779812345678".to_string())
        );
        assert_eq!(normalize_phone(Some("  ")).unwrap(), None);
        assert_eq!(normalize_phone(None).unwrap(), None);
        assert!(normalize_phone(Some("12345")).is_err());
    }
}
