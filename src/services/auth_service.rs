use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    dto::auth::{ActivationClaims, Claims, LoginRequest, LoginResponse},
    entity::{
        shops::Entity as Shops,
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

const ACCESS_TOKEN_HOURS: i64 = 24;
const ACTIVATION_TOKEN_DAYS: i64 = 3;
const ACTIVATION_PURPOSE: &str = "activate";
pub const MIN_PASSWORD_LEN: usize = 8;

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(UserCol::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let Some(password_hash) = user.password_hash.as_deref() else {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    };
    if !verify_password(&password, password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let shop_id = user
        .find_related(Shops)
        .one(&state.orm)
        .await?
        .map(|shop| shop.id);

    let token = issue_access_token(&state.config.jwt_secret, user.id, &user.role, shop_id)?;
    tracing::info!(user_id = %user.id, role = %user.role, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_access_token(
    secret: &str,
    user_id: Uuid,
    role: &str,
    shop_id: Option<i32>,
) -> AppResult<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        shop_id,
        exp: expires_in(Duration::hours(ACCESS_TOKEN_HOURS))?,
    };
    sign(secret, &claims)
}

pub fn decode_access_token(secret: &str, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))
}

pub fn issue_activation_token(secret: &str, user_id: Uuid) -> AppResult<String> {
    let claims = ActivationClaims {
        sub: user_id.to_string(),
        purpose: ACTIVATION_PURPOSE.to_string(),
        exp: expires_in(Duration::days(ACTIVATION_TOKEN_DAYS))?,
    };
    sign(secret, &claims)
}

/// User id carried by a valid activation token.
pub fn decode_activation_token(secret: &str, token: &str) -> AppResult<Uuid> {
    let invalid = || AppError::BadRequest("Activation link is invalid or has expired".into());
    let claims = decode::<ActivationClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| invalid())?
    .claims;
    if claims.purpose != ACTIVATION_PURPOSE {
        return Err(invalid());
    }
    Uuid::parse_str(&claims.sub).map_err(|_| invalid())
}

fn expires_in(duration: Duration) -> AppResult<usize> {
    let expiration = Utc::now()
        .checked_add_signed(duration)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
    Ok(expiration.timestamp() as usize)
}

fn sign<T: serde::Serialize>(secret: &str, claims: &T) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
