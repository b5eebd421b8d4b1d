use crate::entities::{
    PaymentMethod, TransactionStatus, TransactionType, transaction_entity, wallet_entity,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub balance: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<wallet_entity::Model> for WalletResponse {
    fn from(w: wallet_entity::Model) -> Self {
        Self {
            balance: w.balance,
            currency: w.currency,
            is_active: w.is_active,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// TOPUP, RENTAL, REFUND or FINE
    pub transaction_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub gateway_reference: Option<String>,
    pub related_rental_id: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<transaction_entity::Model> for TransactionResponse {
    fn from(t: transaction_entity::Model) -> Self {
        Self {
            transaction_id: t.transaction_id,
            transaction_type: t.transaction_type,
            amount: t.amount,
            status: t.status,
            balance_before: t.balance_before,
            balance_after: t.balance_after,
            payment_method: t.payment_method,
            gateway_reference: t.gateway_reference,
            related_rental_id: t.related_rental_id,
            description: t.description,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopupRequest {
    #[schema(value_type = String, example = "500.00")]
    pub amount: Decimal,
    /// khalti, esewa or stripe
    #[schema(example = "khalti")]
    pub gateway: String,
}

/// Body posted by a payment gateway once a top-up settles.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentWebhookPayload {
    pub transaction_id: String,
    pub gateway_reference: String,
    /// SUCCESS or FAILED
    pub status: String,
}
