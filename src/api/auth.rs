//! Registration, login and password-reset endpoints.
//!
//! Passwords are hashed with Argon2. Login and reset tokens are HS256 JWTs
//! expiring after one hour; the reset token is additionally persisted on the
//! user row so a used or superseded token can be cleared.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{
    ConfirmResetRequest, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, User, UserSummary,
};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_email, validate_password, validate_username};

/// Claims carried by the login token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
}

/// Claims carried by the password-reset token
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub exp: i64,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Sign the one-hour login token
pub fn sign_login_token(user: &User, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Sign the one-hour password-reset token
pub fn sign_reset_token(email: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = ResetClaims {
        email: email.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode a reset token, rejecting bad signatures and expired tokens
pub fn decode_reset_token(
    token: &str,
    secret: &str,
) -> Result<ResetClaims, jsonwebtoken::errors::Error> {
    let data = decode::<ResetClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn validate_register_request(req: &RegisterRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_username(&req.username) {
        errors.add("username", &e);
    }
    if let Err(e) = validate_email(&req.email) {
        errors.add("email", &e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", &e);
    }

    errors.finish()
}

/// Issue a reset token, persist it on the user row and email the reset link.
/// Mail failures are logged, never surfaced.
async fn issue_reset_token(state: &AppState, email: &str) -> Result<(), ApiError> {
    let token = sign_reset_token(email, &state.config.auth.jwt_secret)
        .map_err(|e| ApiError::internal(format!("Failed to sign reset token: {}", e)))?;
    let expires = Utc::now() + Duration::hours(1);

    sqlx::query(
        "UPDATE usuarios SET reset_token = $1, reset_token_expires = $2, updated_at = now()
         WHERE email = $3",
    )
    .bind(&token)
    .bind(expires)
    .bind(email)
    .execute(&state.db)
    .await?;

    let reset_link = format!(
        "{}/reset-password?token={}",
        state.config.cors.frontend_origin, token
    );
    if let Err(e) = state.mailer.send_password_reset(email, &reset_link).await {
        tracing::error!(email = %email, error = %e, "Failed to send reset email");
    }

    Ok(())
}

/// Register endpoint. An already-registered email never creates a second row;
/// it triggers the reset-email path instead.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    validate_register_request(&request)?;

    let existing: Option<User> = sqlx::query_as("SELECT * FROM usuarios WHERE email = $1")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    if existing.is_some() {
        issue_reset_token(&state, &request.email).await?;
        return Ok((
            StatusCode::OK,
            Json(RegisterResponse {
                already_exists: true,
                message: "Email already registered; a password-reset email has been sent"
                    .to_string(),
            }),
        ));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    // Accounts are verified on creation; there is no email-confirmation step.
    sqlx::query(
        "INSERT INTO usuarios (username, email, password_hash, is_verified, lat, lng)
         VALUES ($1, $2, $3, TRUE, $4, $5)",
    )
    .bind(&request.username)
    .bind(&request.email)
    .bind(&password_hash)
    .bind(request.lat)
    .bind(request.lng)
    .execute(&state.db)
    .await?;

    tracing::info!(email = %request.email, "Registered new user");

    if let Err(e) = state
        .mailer
        .send_welcome(&request.email, &request.username, &request.password)
        .await
    {
        tracing::error!(email = %request.email, error = %e, "Failed to send welcome email");
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            already_exists: false,
            message: "User registered successfully; you can now log in".to_string(),
        }),
    ))
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM usuarios WHERE username = $1")
        .bind(&request.username)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Incorrect password"));
    }

    if !user.is_verified {
        return Err(ApiError::forbidden(
            "Please verify your email before logging in",
        ));
    }

    let token = sign_login_token(&user, &state.config.auth.jwt_secret)
        .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: UserSummary::from(&user),
        token,
    }))
}

/// Request a password-reset email
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let existing: Option<User> = sqlx::query_as("SELECT * FROM usuarios WHERE email = $1")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    if existing.is_none() {
        return Err(ApiError::not_found("Email not found"));
    }

    issue_reset_token(&state, &request.email).await?;

    Ok(Json(serde_json::json!({
        "message": "Password-reset email sent"
    })))
}

/// Confirm a password reset with the emailed token
pub async fn confirm_reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmResetRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.token.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::validation(
            "Token and new password are both required",
        ));
    }
    if let Err(e) = validate_password(&request.new_password) {
        return Err(ApiError::validation(e));
    }

    let claims = decode_reset_token(&request.token, &state.config.auth.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired reset token"))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM usuarios WHERE email = $1")
        .bind(&claims.email)
        .fetch_optional(&state.db)
        .await?;
    let user = user.ok_or_else(|| ApiError::not_found("User not found"))?;

    let password_hash = hash_password(&request.new_password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    // Clearing the token columns invalidates the link that was just used.
    sqlx::query(
        "UPDATE usuarios
         SET password_hash = $1, reset_token = NULL, reset_token_expires = NULL,
             updated_at = now()
         WHERE id = $2",
    )
    .bind(&password_hash)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    tracing::info!(user_id = user.id, "Password reset completed");

    Ok(Json(serde_json::json!({
        "message": "Password updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("yogurt-fresa-1L").unwrap();
        assert!(verify_password("yogurt-fresa-1L", &hash));
        assert!(!verify_password("otra-clave", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("whatever", "not-a-phc-string"));
    }

    #[test]
    fn test_reset_token_roundtrip() {
        let token = sign_reset_token("ruta12@lactolac.com.sv", "secret").unwrap();
        let claims = decode_reset_token(&token, "secret").unwrap();
        assert_eq!(claims.email, "ruta12@lactolac.com.sv");
    }

    #[test]
    fn test_reset_token_rejects_wrong_secret() {
        let token = sign_reset_token("ruta12@lactolac.com.sv", "secret").unwrap();
        assert!(decode_reset_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_reset_token_is_rejected() {
        let claims = ResetClaims {
            email: "ruta12@lactolac.com.sv".to_string(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(decode_reset_token(&token, "secret").is_err());
    }
}
