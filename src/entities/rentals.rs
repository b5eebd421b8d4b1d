use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// PENDING -> ACTIVE -> OVERDUE -> COMPLETED, with PENDING -> CANCELLED and
/// ACTIVE -> COMPLETED as shortcuts.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentalStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "OVERDUE")]
    Overdue,
}

impl RentalStatus {
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        use RentalStatus::*;
        matches!(
            (*self, next),
            (Pending, Active)
                | (Pending, Cancelled)
                | (Active, Completed)
                | (Active, Overdue)
                | (Overdue, Completed)
        )
    }

    /// The power bank is out of the station (or about to be).
    pub const OPEN: [RentalStatus; 3] = [
        RentalStatus::Pending,
        RentalStatus::Active,
        RentalStatus::Overdue,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "PENDING" => Some(RentalStatus::Pending),
            "ACTIVE" => Some(RentalStatus::Active),
            "COMPLETED" => Some(RentalStatus::Completed),
            "CANCELLED" => Some(RentalStatus::Cancelled),
            "OVERDUE" => Some(RentalStatus::Overdue),
            _ => None,
        }
    }
}

impl std::fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RentalStatus::Pending => write!(f, "PENDING"),
            RentalStatus::Active => write!(f, "ACTIVE"),
            RentalStatus::Completed => write!(f, "COMPLETED"),
            RentalStatus::Cancelled => write!(f, "CANCELLED"),
            RentalStatus::Overdue => write!(f, "OVERDUE"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "rentals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub rental_code: String,
    pub user_id: i64,
    pub station_id: i64,
    pub return_station_id: Option<i64>,
    pub slot_id: i64,
    pub power_bank_id: i64,
    pub package_id: i64,
    pub status: RentalStatus,
    pub amount_paid: Decimal,
    pub rate_per_minute: Decimal,
    pub started_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub overdue_minutes: i64,
    pub late_fee: Decimal,
    pub late_fee_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Whole minutes past the due time at `at`, never negative.
    pub fn overdue_minutes_at(&self, at: DateTime<Utc>) -> i64 {
        match self.due_at {
            Some(due) => (at - due).num_minutes().max(0),
            None => 0,
        }
    }

    pub fn has_outstanding_fee(&self) -> bool {
        !self.late_fee_paid && self.late_fee > Decimal::ZERO
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn rental(due_at: Option<DateTime<Utc>>) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            rental_code: "RNT-TEST".into(),
            user_id: 1,
            station_id: 1,
            return_station_id: None,
            slot_id: 1,
            power_bank_id: 1,
            package_id: 1,
            status: RentalStatus::Active,
            amount_paid: Decimal::from(50),
            rate_per_minute: Decimal::new(8333, 4),
            started_at: Some(now - Duration::minutes(60)),
            due_at,
            ended_at: None,
            overdue_minutes: 0,
            late_fee: Decimal::ZERO,
            late_fee_paid: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transitions() {
        use RentalStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Overdue));
        assert!(Active.can_transition_to(Completed));
        assert!(Overdue.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Active.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Active));
        assert!(!Overdue.can_transition_to(Cancelled));
    }

    #[test]
    fn test_overdue_minutes_floor_and_clamp() {
        let due = Utc::now();
        let r = rental(Some(due));
        assert_eq!(r.overdue_minutes_at(due - Duration::minutes(10)), 0);
        assert_eq!(r.overdue_minutes_at(due + Duration::seconds(59)), 0);
        assert_eq!(r.overdue_minutes_at(due + Duration::seconds(61)), 1);
        assert_eq!(r.overdue_minutes_at(due + Duration::minutes(125)), 125);
    }

    #[test]
    fn test_overdue_minutes_without_due_time() {
        let r = rental(None);
        assert_eq!(r.overdue_minutes_at(Utc::now()), 0);
    }

    #[test]
    fn test_outstanding_fee() {
        let mut r = rental(None);
        assert!(!r.has_outstanding_fee());
        r.late_fee = Decimal::from(20);
        r.late_fee_paid = false;
        assert!(r.has_outstanding_fee());
    }

    #[test]
    fn test_open_statuses() {
        assert!(RentalStatus::OPEN.contains(&RentalStatus::Pending));
        assert!(RentalStatus::OPEN.contains(&RentalStatus::Overdue));
        assert!(!RentalStatus::OPEN.contains(&RentalStatus::Completed));
        assert!(!RentalStatus::OPEN.contains(&RentalStatus::Cancelled));
    }
}
