use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    #[sea_orm(string_value = "TOPUP")]
    Topup,
    #[sea_orm(string_value = "RENTAL")]
    Rental,
    #[sea_orm(string_value = "REFUND")]
    Refund,
    #[sea_orm(string_value = "FINE")]
    Fine,
}

impl TransactionType {
    /// Whether the amount is added to the wallet (otherwise it is taken out).
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionType::Topup | TransactionType::Refund)
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Topup => write!(f, "TOPUP"),
            TransactionType::Rental => write!(f, "RENTAL"),
            TransactionType::Refund => write!(f, "REFUND"),
            TransactionType::Fine => write!(f, "FINE"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "WALLET")]
    Wallet,
    #[sea_orm(string_value = "KHALTI")]
    Khalti,
    #[sea_orm(string_value = "ESEWA")]
    Esewa,
    #[sea_orm(string_value = "STRIPE")]
    Stripe,
}

impl PaymentMethod {
    /// Gateway name as it appears in webhook paths.
    pub fn from_gateway(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "khalti" => Some(PaymentMethod::Khalti),
            "esewa" => Some(PaymentMethod::Esewa),
            "stripe" => Some(PaymentMethod::Stripe),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub user_id: i64,
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
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_types() {
        assert!(TransactionType::Topup.is_credit());
        assert!(TransactionType::Refund.is_credit());
        assert!(!TransactionType::Rental.is_credit());
        assert!(!TransactionType::Fine.is_credit());
    }

    #[test]
    fn test_gateway_names() {
        assert_eq!(PaymentMethod::from_gateway("Khalti"), Some(PaymentMethod::Khalti));
        assert_eq!(PaymentMethod::from_gateway("esewa"), Some(PaymentMethod::Esewa));
        assert_eq!(PaymentMethod::from_gateway("wallet"), None);
    }
}
