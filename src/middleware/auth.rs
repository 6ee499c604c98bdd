use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    error::AppError,
    models::{ROLE_STAFF, ROLE_USER},
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

impl AuthUser {
    pub fn customer(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ROLE_USER.to_string(),
        }
    }

    pub fn staff(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ROLE_STAFF.to_string(),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == ROLE_STAFF
    }
}

pub fn ensure_role(user: &AuthUser, role: &str) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, ROLE_STAFF)
}

/// Owners may touch their own resources, staff may touch any.
pub fn ensure_owner_or_staff(user: &AuthUser, owner_id: Uuid) -> Result<(), AppError> {
    if user.user_id == owner_id || user.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?;

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_passes_every_ownership_check() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner_or_staff(&AuthUser::customer(owner), owner).is_ok());
        assert!(ensure_owner_or_staff(&AuthUser::staff(Uuid::new_v4()), owner).is_ok());
        assert!(matches!(
            ensure_owner_or_staff(&AuthUser::customer(Uuid::new_v4()), owner),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn customers_are_not_staff() {
        assert!(ensure_staff(&AuthUser::customer(Uuid::new_v4())).is_err());
        assert!(ensure_staff(&AuthUser::staff(Uuid::new_v4())).is_ok());
    }
}
