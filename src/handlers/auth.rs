//! Authorization hook
//!
//! Session issuance lives outside this service. Handlers identify the
//! operator through the `X-User-UUID` header (or `operator_uuid` query
//! parameter) and consult the permission hook against the user row.

use axum::http::HeaderMap;
use sqlx::PgPool;
use uuid::Uuid;

use crate::constants::permissions;
use crate::db::repositories::UserRepository;
use crate::error::{AppError, AppResult};

/// Does the user hold the given permission code? Unknown users hold none.
pub async fn has_permission(pool: &PgPool, user_uuid: &Uuid, code: &str) -> AppResult<bool> {
    let Some(user) = UserRepository::find_by_uuid(pool, user_uuid).await? else {
        return Ok(false);
    };
    Ok(user.is_active() && user.has_permission(code))
}

/// Extract the operator identity from headers or the query string.
pub fn operator_uuid(headers: &HeaderMap, query_operator: Option<&str>) -> AppResult<Uuid> {
    let raw = headers
        .get("X-User-UUID")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(query_operator.map(str::trim).filter(|s| !s.is_empty()))
        .ok_or(AppError::Unauthorized)?;

    Uuid::parse_str(raw).map_err(|_| AppError::Unauthorized)
}

/// Require an active operator account and return it.
pub async fn require_operator(pool: &PgPool, operator: &Uuid) -> AppResult<()> {
    let user = UserRepository::find_by_uuid(pool, operator)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !user.is_active() {
        return Err(AppError::Forbidden("用户已被禁用".to_string()));
    }
    Ok(())
}

/// A user may read or change their own state; anyone else needs admin.
pub async fn ensure_self_or_admin(
    pool: &PgPool,
    operator: &Uuid,
    target: &Uuid,
) -> AppResult<()> {
    if operator == target {
        return Ok(());
    }
    if has_permission(pool, operator, permissions::ADMIN).await? {
        return Ok(());
    }
    Err(AppError::Forbidden("无权限".to_string()))
}

/// Admin-only guard for mutating endpoints.
pub async fn ensure_admin(pool: &PgPool, operator: &Uuid) -> AppResult<()> {
    if has_permission(pool, operator, permissions::ADMIN).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden("仅管理员可执行该操作".to_string()))
    }
}
