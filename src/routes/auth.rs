use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, NaiveDateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::{models::*, AccountRepository};
use crate::error::AppError;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: AccountId,
    pub email: String,
    pub display_name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: i64,
    pub account: AccountResponse,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            id: account.id,
            email: account.email,
            display_name: account.display_name,
            created_at: account.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account and issue a token
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if request.display_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Display name cannot be empty".to_string(),
        ));
    }
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;

    let account = AccountRepository::create(
        &state.db,
        &email,
        request.display_name.trim(),
        &password_hash,
    )
    .await?;

    tracing::info!("Account registered: {}", account.id);

    let (token, expires_at) = create_jwt(&state, &account.id)?;

    Ok(Json(AuthResponse {
        token,
        expires_at,
        account: account.into(),
    }))
}

/// Authenticate with email + password and issue a token
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = request.email.trim().to_lowercase();

    let account = AccountRepository::find_by_email(&state.db, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = bcrypt::verify(&request.password, &account.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to verify password: {}", e)))?;
    if !valid {
        tracing::debug!("Failed login attempt for {}", email);
        return Err(AppError::Unauthorized);
    }

    let (token, expires_at) = create_jwt(&state, &account.id)?;

    Ok(Json(AuthResponse {
        token,
        expires_at,
        account: account.into(),
    }))
}

/// Get current account info
async fn me(
    State(_state): State<Arc<AppState>>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<AccountResponse>, AppError> {
    Ok(Json(account.into()))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get the calling account from a bearer token string
pub async fn get_account_from_token(
    state: &Arc<AppState>,
    token: &str,
) -> Result<Account, AppError> {
    let claims = decode_jwt(state, token)?;
    let account_id = AccountId::parse(&claims.sub).map_err(|_| AppError::Unauthorized)?;
    let account = AccountRepository::find_by_id(&state.db, &account_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(account)
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Create a signed JWT for an account id, returning (token, expiry timestamp)
fn create_jwt(state: &Arc<AppState>, account_id: &AccountId) -> Result<(String, i64), AppError> {
    let now = Utc::now();
    let exp = now + Duration::hours(state.config.jwt.expiration_hours);
    let claims = Claims {
        sub: account_id.to_string(),
        iat: now.timestamp() as usize,
        exp: exp.timestamp() as usize,
    };

    let header = Header::default();
    let token = encode(
        &header,
        &claims,
        &EncodingKey::from_secret(state.config.jwt.secret.as_bytes()),
    )?;
    Ok((token, exp.timestamp()))
}

/// Decode and validate a JWT, returning the claims
fn decode_jwt(state: &Arc<AppState>, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

// ============================================================================
// Auth Middleware / Extractor
// ============================================================================

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Extractor for the authenticated account
pub struct AuthAccount(pub Account);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthAccount {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header (Bearer token)
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let account = get_account_from_token(state, token).await.map_err(|e| {
            tracing::debug!("Failed to get account from token: {:?}", e);
            e
        })?;

        Ok(AuthAccount(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn issued_token_resolves_back_to_the_account() {
        let state = testing::state().await;
        let account = testing::account(&state, "me@example.com").await;

        let (token, _) = create_jwt(&state, &account.id).unwrap();
        let resolved = get_account_from_token(&state, &token).await.unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let state = testing::state().await;

        let err = get_account_from_token(&state, "not-a-token")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Jwt(_)));
    }

    #[tokio::test]
    async fn token_for_deleted_account_is_rejected() {
        let state = testing::state().await;
        let (token, _) = create_jwt(&state, &AccountId::generate()).unwrap();

        let err = get_account_from_token(&state, &token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
