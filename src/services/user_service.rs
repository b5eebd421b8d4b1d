use crate::entities::{UserStatus, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::auth_service::{normalize_phone, validate_full_name};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(self.find_user(user_id).await?.into())
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        if request.full_name.is_none() && request.phone.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }
        if let Some(full_name) = &request.full_name {
            validate_full_name(full_name)?;
        }
        let phone = normalize_phone(request.phone.as_deref())?;

        let mut am = self.find_user(user_id).await?.into_active_model();
        if let Some(full_name) = request.full_name {
            am.full_name = Set(full_name.trim().to_string());
        }
        if phone.is_some() {
            am.phone = Set(phone);
        }
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;
        Ok(updated.into())
    }

    pub async fn list_users(&self, query: &UserListQuery) -> AppResult<PaginatedResponse<UserResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);

        let mut select = users::Entity::find();
        if let Some(raw) = query.status.as_deref() {
            let status = parse_user_status(raw)?;
            select = select.filter(users::Column::Status.eq(status));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(users::Column::Email.contains(search))
                    .add(users::Column::FullName.contains(search)),
            );
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(users::Column::CreatedAt)
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

    /// Soft ban / unban. Accounts are never deleted.
    pub async fn set_status(
        &self,
        actor_id: i64,
        user_id: i64,
        request: SetUserStatusRequest,
    ) -> AppResult<UserResponse> {
        if actor_id == user_id {
            return Err(AppError::ValidationError(
                "You cannot change your own account status".to_string(),
            ));
        }
        let user = self.find_user(user_id).await?;
        let previous = user.status;

        let mut am = user.into_active_model();
        am.status = Set(request.status);
        am.updated_at = Set(Utc::now());
        let updated = am.update(&self.pool).await?;

        log::info!(
            "User status changed by staff: user_id={}, {} -> {}, actor_id={}, reason={}",
            user_id,
            previous,
            updated.status,
            actor_id,
            request.reason.as_deref().unwrap_or("-")
        );
        Ok(updated.into())
    }

    async fn find_user(&self, user_id: i64) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn parse_user_status(raw: &str) -> AppResult<UserStatus> {
    match raw.to_ascii_uppercase().as_str() {
        "ACTIVE" => Ok(UserStatus::Active),
        "BANNED" => Ok(UserStatus::Banned),
        "INACTIVE" => Ok(UserStatus::Inactive),
        _ => Err(AppError::ValidationError(format!("Unknown user status: {raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_status() {
        assert_eq!(parse_user_status("banned").unwrap(), UserStatus::Banned);
        assert!(parse_user_status("deleted").is_err());
    }
}
