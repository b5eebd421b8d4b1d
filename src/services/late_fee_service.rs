use crate::entities::late_fee_config_entity as configs;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateLateFeeConfigRequest, LateFeeConfigResponse, LateFeePreviewRequest,
    LateFeePreviewResponse, UpdateLateFeeConfigRequest,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

/// Row changes needed to make `target` the only active configuration.
#[derive(Debug, PartialEq, Eq)]
pub struct ActivationPlan {
    pub deactivate: Vec<i64>,
    pub activate: Option<i64>,
}

/// `active` holds the ids currently flagged active.
pub fn plan_activation(active: &[i64], target: i64) -> ActivationPlan {
    ActivationPlan {
        deactivate: active.iter().copied().filter(|id| *id != target).collect(),
        activate: (!active.contains(&target)).then_some(target),
    }
}

#[derive(Clone)]
pub struct LateFeeService {
    pool: DatabaseConnection,
}

impl LateFeeService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_configs(&self) -> AppResult<Vec<LateFeeConfigResponse>> {
        let rows = configs::Entity::find()
            .order_by_desc(configs::Column::IsActive)
            .order_by_asc(configs::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_config(&self, id: i64) -> AppResult<LateFeeConfigResponse> {
        Ok(self.find_config(id).await?.into())
    }

    pub async fn create_config(
        &self,
        request: CreateLateFeeConfigRequest,
    ) -> AppResult<LateFeeConfigResponse> {
        request.validate()?;
        let now = Utc::now();
        let row = configs::ActiveModel {
            name: Set(request.name.trim().to_string()),
            fee_type: Set(request.fee_type),
            multiplier: Set(request.multiplier.unwrap_or(Decimal::new(20, 1))),
            flat_rate_per_hour: Set(request.flat_rate_per_hour.unwrap_or(Decimal::ZERO)),
            grace_period_minutes: Set(request.grace_period_minutes.unwrap_or(0)),
            max_daily_rate: Set(request.max_daily_rate),
            is_active: Set(false),
            applicable_package_types: Set(request.applicable_package_types.unwrap_or(json!([]))),
            metadata: Set(request.metadata.unwrap_or(json!({}))),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Late fee configuration created: id={}, name={}", row.id, row.name);
        Ok(row.into())
    }

    pub async fn update_config(
        &self,
        id: i64,
        request: UpdateLateFeeConfigRequest,
    ) -> AppResult<LateFeeConfigResponse> {
        request.validate()?;
        let existing = self.find_config(id).await?;

        let mut am = existing.into_active_model();
        if let Some(name) = request.name {
            am.name = Set(name.trim().to_string());
        }
        if let Some(fee_type) = request.fee_type {
            am.fee_type = Set(fee_type);
        }
        if let Some(multiplier) = request.multiplier {
            am.multiplier = Set(multiplier);
        }
        if let Some(flat) = request.flat_rate_per_hour {
            am.flat_rate_per_hour = Set(flat);
        }
        if let Some(grace) = request.grace_period_minutes {
            am.grace_period_minutes = Set(grace);
        }
        if request.clear_max_daily_rate.unwrap_or(false) {
            am.max_daily_rate = Set(None);
        } else if let Some(max_daily) = request.max_daily_rate {
            am.max_daily_rate = Set(Some(max_daily));
        }
        if let Some(types) = request.applicable_package_types {
            am.applicable_package_types = Set(types);
        }
        if let Some(metadata) = request.metadata {
            am.metadata = Set(metadata);
        }
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        log::info!("Late fee configuration updated: id={}", updated.id);
        Ok(updated.into())
    }

    pub async fn delete_config(&self, id: i64) -> AppResult<()> {
        let existing = self.find_config(id).await?;
        if existing.is_active {
            return Err(AppError::service(
                "cannot_delete_active_config",
                "Active late fee configuration cannot be deleted",
            ));
        }
        configs::Entity::delete_by_id(id).exec(&self.pool).await?;
        log::info!("Late fee configuration deleted: id={id}");
        Ok(())
    }

    /// Makes `id` the single active configuration.
    pub async fn activate_config(&self, id: i64) -> AppResult<LateFeeConfigResponse> {
        let txn = self.pool.begin().await?;

        let target = configs::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Late fee configuration not found".to_string()))?;

        let active_ids: Vec<i64> = configs::Entity::find()
            .select_only()
            .column(configs::Column::Id)
            .filter(configs::Column::IsActive.eq(true))
            .lock_exclusive()
            .into_tuple()
            .all(&txn)
            .await?;
        let plan = plan_activation(&active_ids, target.id);

        let now = Utc::now();
        if !plan.deactivate.is_empty() {
            configs::Entity::update_many()
                .col_expr(configs::Column::IsActive, Expr::value(false))
                .col_expr(configs::Column::UpdatedAt, Expr::value(now))
                .filter(configs::Column::Id.is_in(plan.deactivate.clone()))
                .exec(&txn)
                .await?;
        }

        let activated = if plan.activate.is_some() {
            let mut am = target.into_active_model();
            am.is_active = Set(true);
            am.updated_at = Set(now);
            am.update(&txn).await?
        } else {
            target
        };

        txn.commit().await?;

        log::info!(
            "Late fee configuration activated: id={}, deactivated={:?}",
            activated.id,
            plan.deactivate
        );
        Ok(activated.into())
    }

    /// The active configuration, or the built-in default when none is active.
    pub async fn active_config(&self) -> AppResult<LateFeeConfigResponse> {
        Ok(self.current_config(&self.pool).await?.into())
    }

    pub async fn current_config<C: ConnectionTrait>(&self, conn: &C) -> AppResult<configs::Model> {
        let active = configs::Entity::find()
            .filter(configs::Column::IsActive.eq(true))
            .one(conn)
            .await?;
        Ok(active.unwrap_or_else(configs::Model::builtin_default))
    }

    /// Fee the configuration would charge, without touching any rental.
    pub async fn preview(
        &self,
        id: i64,
        request: &LateFeePreviewRequest,
    ) -> AppResult<LateFeePreviewResponse> {
        request.validate()?;
        let config = if id == 0 {
            configs::Model::builtin_default()
        } else {
            self.find_config(id).await?
        };
        let late_fee =
            config.calculate_late_fee(request.normal_rate_per_minute, request.overdue_minutes)?;

        Ok(LateFeePreviewResponse {
            config_id: config.id,
            config_name: config.name.clone(),
            normal_rate_per_minute: request.normal_rate_per_minute,
            overdue_minutes: request.overdue_minutes,
            late_fee,
            description: config.get_description(),
        })
    }

    async fn find_config(&self, id: i64) -> AppResult<configs::Model> {
        configs::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Late fee configuration not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies a plan to (id, is_active) rows.
    fn apply(rows: &mut [(i64, bool)], plan: &ActivationPlan) {
        for row in rows.iter_mut() {
            if plan.deactivate.contains(&row.0) {
                row.1 = false;
            }
            if plan.activate == Some(row.0) {
                row.1 = true;
            }
        }
    }

    fn active_ids(rows: &[(i64, bool)]) -> Vec<i64> {
        rows.iter().filter(|r| r.1).map(|r| r.0).collect()
    }

    #[test]
    fn test_activation_switches_single_active() {
        let mut rows = vec![(1, true), (2, false), (3, false)];
        let plan = plan_activation(&active_ids(&rows), 3);
        assert_eq!(plan.deactivate, vec![1]);
        assert_eq!(plan.activate, Some(3));
        apply(&mut rows, &plan);
        assert_eq!(active_ids(&rows), vec![3]);
    }

    #[test]
    fn test_activation_repairs_multiple_actives() {
        let mut rows = vec![(1, true), (2, true), (3, false)];
        let plan = plan_activation(&active_ids(&rows), 2);
        assert_eq!(plan.deactivate, vec![1]);
        assert_eq!(plan.activate, None);
        apply(&mut rows, &plan);
        assert_eq!(active_ids(&rows), vec![2]);
    }

    #[test]
    fn test_activation_with_none_active() {
        let mut rows = vec![(1, false), (2, false)];
        let plan = plan_activation(&active_ids(&rows), 1);
        assert!(plan.deactivate.is_empty());
        apply(&mut rows, &plan);
        assert_eq!(active_ids(&rows), vec![1]);
    }

    #[test]
    fn test_activating_already_active_is_noop() {
        let plan = plan_activation(&[4], 4);
        assert_eq!(
            plan,
            ActivationPlan {
                deactivate: vec![],
                activate: None
            }
        );
    }
}
