use crate::config::RewardsConfig;
use crate::entities::{
    PaymentMethod, PointsSource, TransactionStatus, TransactionType,
    transaction_entity as transactions, wallet_entity as wallets,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PaginatedResponse, PaginationParams, TopupRequest, TransactionListQuery, TransactionResponse,
    WalletResponse,
};
use crate::services::{PointsEntry, PointsService};
use crate::utils::generate_transaction_id;
use actix_web::http::StatusCode;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

pub const MIN_TOPUP_NPR: i64 = 10;
pub const MAX_TOPUP_NPR: i64 = 50_000;

pub fn validate_topup_amount(amount: Decimal) -> AppResult<()> {
    if amount < Decimal::from(MIN_TOPUP_NPR) || amount > Decimal::from(MAX_TOPUP_NPR) {
        return Err(AppError::service(
            "invalid_amount",
            format!("Top-up amount must be between NPR {MIN_TOPUP_NPR} and NPR {MAX_TOPUP_NPR}"),
        ));
    }
    if amount.scale() > 2 && amount != amount.round_dp(2) {
        return Err(AppError::service(
            "invalid_amount",
            "Top-up amount cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

/// Points for a top-up: `per_100` for every full 100 NPR.
pub fn topup_points(amount: Decimal, per_100: i64) -> i64 {
    if per_100 <= 0 || amount <= Decimal::ZERO {
        return 0;
    }
    let hundreds = (amount / Decimal::from(100)).floor().to_i64().unwrap_or(0);
    hundreds.saturating_mul(per_100)
}

/// New wallet balance after a ledger movement.
pub fn apply_wallet_movement(
    balance: Decimal,
    amount: Decimal,
    transaction_type: TransactionType,
) -> AppResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(AppError::ValidationError(
            "Transaction amount must be positive".into(),
        ));
    }
    if transaction_type.is_credit() {
        return Ok(balance + amount);
    }
    if balance < amount {
        return Err(AppError::service(
            "insufficient_balance",
            format!("Insufficient wallet balance: NPR {balance}, required NPR {amount}"),
        )
        .with_status(StatusCode::PAYMENT_REQUIRED)
        .with_details(serde_json::json!({
            "balance": balance.to_string(),
            "required": amount.to_string(),
        })));
    }
    Ok(balance - amount)
}

/// Wallet credit for redeeming `points`; only whole NPR amounts are exchanged.
pub fn redemption_value(points: i64, points_per_npr: i64) -> AppResult<Decimal> {
    if points_per_npr <= 0 {
        return Err(AppError::service(
            "redemption_disabled",
            "Points redemption is currently disabled",
        ));
    }
    if points <= 0 || points % points_per_npr != 0 {
        return Err(AppError::service(
            "invalid_amount",
            format!("Points must be a positive multiple of {points_per_npr}"),
        ));
    }
    Ok(Decimal::from(points / points_per_npr))
}

/// A webhook may only settle top-ups that were opened against its own gateway.
pub fn ensure_gateway_matches(method: PaymentMethod, gateway: &str) -> AppResult<()> {
    match PaymentMethod::from_gateway(gateway) {
        Some(g) if g == method => Ok(()),
        Some(_) => Err(AppError::service(
            "gateway_mismatch",
            format!("Transaction was not initiated through {gateway}"),
        )
        .with_status(StatusCode::CONFLICT)),
        None => Err(AppError::service(
            "unknown_gateway",
            format!("Unknown payment gateway: {gateway}"),
        )),
    }
}

/// Disabled wallets still take refunds so cancelled rentals are made whole.
pub fn ensure_wallet_accepts(is_active: bool, transaction_type: TransactionType) -> AppResult<()> {
    if is_active || transaction_type == TransactionType::Refund {
        Ok(())
    } else {
        Err(wallet_inactive())
    }
}

#[derive(Clone)]
pub struct WalletService {
    pool: DatabaseConnection,
    points_service: PointsService,
    rewards: RewardsConfig,
}

impl WalletService {
    pub fn new(pool: DatabaseConnection, points_service: PointsService, rewards: RewardsConfig) -> Self {
        Self {
            pool,
            points_service,
            rewards,
        }
    }

    pub async fn get_wallet(&self, user_id: i64) -> AppResult<WalletResponse> {
        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))?;
        Ok(wallet.into())
    }

    pub async fn list_transactions(
        &self,
        user_id: i64,
        query: &TransactionListQuery,
    ) -> AppResult<PaginatedResponse<TransactionResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));
        if let Some(raw) = query.transaction_type.as_deref() {
            let tx_type = parse_transaction_type(raw)?;
            select = select.filter(transactions::Column::TransactionType.eq(tx_type));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(params.get_offset())
            .limit(params.get_limit())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    /// Opens a PENDING top-up; the gateway webhook settles it.
    pub async fn create_topup(
        &self,
        user_id: i64,
        request: TopupRequest,
    ) -> AppResult<TransactionResponse> {
        validate_topup_amount(request.amount)?;
        let method = PaymentMethod::from_gateway(&request.gateway).ok_or_else(|| {
            AppError::service(
                "unsupported_gateway",
                format!("Unsupported payment gateway: {}", request.gateway),
            )
        })?;

        let wallet = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))?;
        if !wallet.is_active {
            return Err(wallet_inactive());
        }

        let now = Utc::now();
        let row = transactions::ActiveModel {
            transaction_id: Set(generate_transaction_id()),
            user_id: Set(user_id),
            transaction_type: Set(TransactionType::Topup),
            amount: Set(request.amount.round_dp(2)),
            status: Set(TransactionStatus::Pending),
            payment_method: Set(method),
            description: Set(Some(format!("Wallet top-up via {}", request.gateway.to_lowercase()))),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Top-up created: transaction_id={}, user_id={}, amount={}",
            row.transaction_id,
            user_id,
            row.amount
        );
        Ok(row.into())
    }

    /// Settles a top-up. Repeated calls for a settled transaction return it unchanged.
    pub async fn confirm_topup(
        &self,
        gateway: &str,
        transaction_id: &str,
        gateway_reference: &str,
        success: bool,
    ) -> AppResult<TransactionResponse> {
        let txn = self.pool.begin().await?;

        let row = transactions::Entity::find()
            .filter(transactions::Column::TransactionId.eq(transaction_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {transaction_id} not found")))?;

        if row.transaction_type != TransactionType::Topup {
            return Err(AppError::ValidationError(format!(
                "Transaction {transaction_id} is not a top-up"
            )));
        }
        if let Err(e) = ensure_gateway_matches(row.payment_method, gateway) {
            log::warn!(
                "Webhook gateway mismatch: transaction_id={}, gateway={}, method={:?}",
                transaction_id,
                gateway,
                row.payment_method
            );
            return Err(e);
        }
        if row.status != TransactionStatus::Pending {
            log::info!(
                "Top-up already settled, ignoring: transaction_id={}, status={:?}",
                transaction_id,
                row.status
            );
            return Ok(row.into());
        }

        let now = Utc::now();
        if !success {
            let mut am = row.into_active_model();
            am.status = Set(TransactionStatus::Failed);
            am.gateway_reference = Set(Some(gateway_reference.to_string()));
            am.updated_at = Set(now);
            let failed = am.update(&txn).await?;
            txn.commit().await?;
            log::warn!("Top-up failed at gateway: transaction_id={transaction_id}");
            return Ok(failed.into());
        }

        let wallet = self.lock_wallet_tx(&txn, row.user_id).await?;
        let balance_before = wallet.balance;
        let balance_after =
            apply_wallet_movement(balance_before, row.amount, TransactionType::Topup)?;
        self.store_balance_tx(&txn, wallet, balance_after).await?;

        let user_id = row.user_id;
        let amount = row.amount;
        let mut am = row.into_active_model();
        am.status = Set(TransactionStatus::Success);
        am.gateway_reference = Set(Some(gateway_reference.to_string()));
        am.balance_before = Set(Some(balance_before));
        am.balance_after = Set(Some(balance_after));
        am.updated_at = Set(now);
        let settled = am.update(&txn).await?;

        let points = topup_points(amount, self.rewards.topup_points_per_100);
        if points > 0 {
            self.points_service
                .award_points_tx(
                    &txn,
                    user_id,
                    points,
                    PointsEntry::new(PointsSource::Topup, format!("Top-up of NPR {amount}")),
                )
                .await?;
        }

        txn.commit().await?;

        log::info!(
            "Top-up confirmed: transaction_id={}, user_id={}, amount={}, points={}",
            transaction_id,
            user_id,
            amount,
            points
        );
        Ok(settled.into())
    }

    /// Exchanges points for wallet credit in one transaction.
    pub async fn redeem_points(&self, user_id: i64, points: i64) -> AppResult<TransactionResponse> {
        let amount = redemption_value(points, self.rewards.redemption_points_per_npr)?;

        let txn = self.pool.begin().await?;
        self.points_service
            .deduct_points_tx(
                &txn,
                user_id,
                points,
                PointsEntry::new(
                    PointsSource::Redemption,
                    format!("Redeemed for NPR {amount} wallet credit"),
                ),
            )
            .await?;
        let credit = self
            .credit_tx(
                &txn,
                user_id,
                amount,
                TransactionType::Topup,
                None,
                &format!("Redeemed {points} points"),
            )
            .await?;
        txn.commit().await?;

        log::info!(
            "Points redeemed: user_id={}, points={}, amount={}",
            user_id,
            points,
            amount
        );
        Ok(credit.into())
    }

    pub async fn ensure_wallet_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> AppResult<wallets::Model> {
        if let Some(wallet) = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .one(txn)
            .await?
        {
            return Ok(wallet);
        }
        let now = Utc::now();
        let wallet = wallets::ActiveModel {
            user_id: Set(user_id),
            balance: Set(Decimal::ZERO),
            currency: Set("NPR".to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        Ok(wallet)
    }

    /// Takes money out of the wallet inside the caller's transaction.
    pub async fn debit_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: Decimal,
        transaction_type: TransactionType,
        related_rental_id: Option<i64>,
        description: &str,
    ) -> AppResult<transactions::Model> {
        if transaction_type.is_credit() {
            return Err(AppError::InternalError(format!(
                "{transaction_type} cannot be used as a debit"
            )));
        }
        self.move_funds_tx(txn, user_id, amount, transaction_type, related_rental_id, description)
            .await
    }

    /// Puts money back into the wallet inside the caller's transaction.
    pub async fn credit_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: Decimal,
        transaction_type: TransactionType,
        related_rental_id: Option<i64>,
        description: &str,
    ) -> AppResult<transactions::Model> {
        if !transaction_type.is_credit() {
            return Err(AppError::InternalError(format!(
                "{transaction_type} cannot be used as a credit"
            )));
        }
        self.move_funds_tx(txn, user_id, amount, transaction_type, related_rental_id, description)
            .await
    }

    async fn move_funds_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
        amount: Decimal,
        transaction_type: TransactionType,
        related_rental_id: Option<i64>,
        description: &str,
    ) -> AppResult<transactions::Model> {
        let wallet = self.lock_wallet_tx(txn, user_id).await?;
        ensure_wallet_accepts(wallet.is_active, transaction_type)?;
        let balance_before = wallet.balance;
        let balance_after = apply_wallet_movement(balance_before, amount, transaction_type)?;
        self.store_balance_tx(txn, wallet, balance_after).await?;

        let now = Utc::now();
        let row = transactions::ActiveModel {
            transaction_id: Set(generate_transaction_id()),
            user_id: Set(user_id),
            transaction_type: Set(transaction_type),
            amount: Set(amount),
            status: Set(TransactionStatus::Success),
            balance_before: Set(Some(balance_before)),
            balance_after: Set(Some(balance_after)),
            payment_method: Set(PaymentMethod::Wallet),
            related_rental_id: Set(related_rental_id),
            description: Set(Some(description.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await?;
        Ok(row)
    }

    async fn lock_wallet_tx(
        &self,
        txn: &DatabaseTransaction,
        user_id: i64,
    ) -> AppResult<wallets::Model> {
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Wallet not found".to_string()))
    }

    async fn store_balance_tx(
        &self,
        txn: &DatabaseTransaction,
        wallet: wallets::Model,
        balance: Decimal,
    ) -> AppResult<()> {
        let mut am = wallet.into_active_model();
        am.balance = Set(balance);
        am.updated_at = Set(Utc::now());
        am.update(txn).await?;
        Ok(())
    }
}

fn wallet_inactive() -> AppError {
    AppError::service("wallet_inactive", "Wallet is disabled").with_status(StatusCode::FORBIDDEN)
}

fn parse_transaction_type(raw: &str) -> AppResult<TransactionType> {
    match raw.to_ascii_uppercase().as_str() {
        "TOPUP" => Ok(TransactionType::Topup),
        "RENTAL" => Ok(TransactionType::Rental),
        "REFUND" => Ok(TransactionType::Refund),
        "FINE" => Ok(TransactionType::Fine),
        _ => Err(AppError::ValidationError(format!(
            "Unknown transaction type: {raw}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topup_amount_bounds() {
        assert!(validate_topup_amount(Decimal::from(10)).is_ok());
        assert!(validate_topup_amount(Decimal::from(50_000)).is_ok());
        assert_eq!(
            validate_topup_amount(Decimal::new(999, 2)).unwrap_err().code(),
            "invalid_amount"
        );
        assert_eq!(
            validate_topup_amount(Decimal::from(50_001)).unwrap_err().code(),
            "invalid_amount"
        );
    }

    #[test]
    fn test_topup_amount_precision() {
        assert!(validate_topup_amount(Decimal::new(10050, 2)).is_ok());
        assert!(validate_topup_amount(Decimal::new(100_505, 3)).is_err());
        // trailing zeros are fine
        assert!(validate_topup_amount(Decimal::new(100_500, 3)).is_ok());
    }

    #[test]
    fn test_topup_points_per_full_hundred() {
        assert_eq!(topup_points(Decimal::from(99), 10), 0);
        assert_eq!(topup_points(Decimal::from(100), 10), 10);
        assert_eq!(topup_points(Decimal::new(25_075, 2), 10), 20);
        assert_eq!(topup_points(Decimal::from(500), 0), 0);
    }

    #[test]
    fn test_debit_and_credit_movements() {
        let balance = Decimal::from(100);
        assert_eq!(
            apply_wallet_movement(balance, Decimal::from(40), TransactionType::Rental).unwrap(),
            Decimal::from(60)
        );
        assert_eq!(
            apply_wallet_movement(balance, Decimal::from(40), TransactionType::Refund).unwrap(),
            Decimal::from(140)
        );
    }

    #[test]
    fn test_debit_beyond_balance_fails() {
        let err = apply_wallet_movement(Decimal::from(10), Decimal::from(50), TransactionType::Fine)
            .unwrap_err();
        assert_eq!(err.code(), "insufficient_balance");
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        assert!(
            apply_wallet_movement(Decimal::from(10), Decimal::ZERO, TransactionType::Topup).is_err()
        );
    }

    #[test]
    fn test_parse_transaction_type() {
        assert_eq!(parse_transaction_type("fine").unwrap(), TransactionType::Fine);
        assert!(parse_transaction_type("withdrawal").is_err());
    }

    #[test]
    fn test_inactive_wallet_only_takes_refunds() {
        assert!(ensure_wallet_accepts(true, TransactionType::Rental).is_ok());
        assert!(ensure_wallet_accepts(false, TransactionType::Refund).is_ok());
        let err = ensure_wallet_accepts(false, TransactionType::Fine).unwrap_err();
        assert_eq!(err.code(), "wallet_inactive");
        assert!(ensure_wallet_accepts(false, TransactionType::Topup).is_err());
    }

    #[test]
    fn test_webhook_gateway_must_match_payment_method() {
        assert!(ensure_gateway_matches(PaymentMethod::Khalti, "khalti").is_ok());
        assert!(ensure_gateway_matches(PaymentMethod::Esewa, "eSewa").is_ok());

        let err = ensure_gateway_matches(PaymentMethod::Khalti, "stripe").unwrap_err();
        assert_eq!(err.code(), "gateway_mismatch");
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = ensure_gateway_matches(PaymentMethod::Stripe, "paypal").unwrap_err();
        assert_eq!(err.code(), "unknown_gateway");
        assert!(ensure_gateway_matches(PaymentMethod::Wallet, "wallet").is_err());
    }

    #[test]
    fn test_redemption_value() {
        assert_eq!(redemption_value(250, 10).unwrap(), Decimal::from(25));
        assert_eq!(redemption_value(255, 10).unwrap_err().code(), "invalid_amount");
        assert_eq!(redemption_value(0, 10).unwrap_err().code(), "invalid_amount");
        assert_eq!(redemption_value(-10, 10).unwrap_err().code(), "invalid_amount");
        assert_eq!(redemption_value(100, 0).unwrap_err().code(), "redemption_disabled");
    }
}
