use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{error::AppError, services::auth_service::decode_access_token, state::AppState};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SHOP: &str = "shop";

/// Staff member authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
    pub shop_id: Option<i32>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// Admins, or shop staff linked to a shop.
pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if user.is_admin() || (user.role == ROLE_SHOP && user.shop_id.is_some()) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        let claims = decode_access_token(&state.config.jwt_secret, token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
            shop_id: claims.shop_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, shop_id: Option<i32>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role: role.into(),
            shop_id,
        }
    }

    #[test]
    fn staff_needs_admin_role_or_a_shop() {
        assert!(ensure_staff(&user(ROLE_ADMIN, None)).is_ok());
        assert!(ensure_staff(&user(ROLE_SHOP, Some(3))).is_ok());
        assert!(matches!(ensure_staff(&user(ROLE_SHOP, None)), Err(AppError::Forbidden)));
        assert!(matches!(ensure_staff(&user("customer", Some(3))), Err(AppError::Forbidden)));
    }

    #[test]
    fn admin_flag() {
        assert!(user(ROLE_ADMIN, None).is_admin());
        assert!(!user(ROLE_SHOP, Some(1)).is_admin());
    }
}
