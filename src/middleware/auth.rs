use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use moka::sync::Cache; // ✅ High-performance TTL Cache
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::models::user::Role;
use crate::error::AppError;

/// JWT Claims used for authentication.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - user id
    pub sub: String,
    /// Role granted at sign-in (`user` or `admin`)
    pub role: String,
    /// Expiration timestamp (UNIX TIME)
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: Uuid, role: Role, ttl: Duration) -> Self {
        let role = match role {
            Role::Admin => "admin",
            Role::User => "user",
        };
        Self {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: chrono::Utc::now().timestamp() as usize + ttl.as_secs() as usize,
        }
    }

    pub fn encode(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), self, &EncodingKey::from_secret(secret.as_bytes()))
    }
}

/// Verified caller, attached to each authenticated request.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

/// Things a caller may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    RequestBooking,
    ViewOwnAppointments,
    ReviewBookings,
}

impl Identity {
    pub fn can(&self, capability: Capability) -> bool {
        match capability {
            Capability::RequestBooking | Capability::ViewOwnAppointments => true,
            Capability::ReviewBookings => self.role == Role::Admin,
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

/// ✅ **Directory profiles keyed by user id, 10 minute TTL**
pub type IdentityCache = Arc<Cache<Uuid, (String, String)>>;

pub fn create_identity_cache() -> IdentityCache {
    Arc::new(
        Cache::builder()
            .time_to_live(Duration::from_secs(600))
            .max_capacity(10_000)
            .build(),
    )
}

/// ✅ **Session Middleware**: verifies the bearer token and resolves the caller
/// against the Identity Directory.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let header = req.headers().get(AUTHORIZATION).cloned();
    let identity = resolve_identity(&state, header)
        .await
        .map_err(|err| state.fail(err).into_response())?;

    debug!(user_id = %identity.user_id, role = ?identity.role, "session verified");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

async fn resolve_identity(state: &AppState, header: Option<HeaderValue>) -> Result<Identity, AppError> {
    let header = header
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token format".to_string()))?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!(error = %e, "JWT decoding failed");
        AppError::Unauthorized("Invalid token".to_string())
    })?
    .claims;

    let user_id: Uuid = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    let (name, email) = match state.identities.get(&user_id) {
        Some(profile) => profile,
        None => {
            let user = state
                .store
                .find_user(user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("Account not found".to_string()))?;
            let profile = (user.name, user.email);
            state.identities.insert(user_id, profile.clone());
            profile
        }
    };

    Ok(Identity {
        user_id,
        role: Role::from_claim(&claims.role),
        name,
        email,
    })
}

/// ✅ **Admin gate**, layered after [`authenticate`]
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, Response> {
    let allowed = req
        .extensions()
        .get::<Identity>()
        .map(|identity| identity.require(Capability::ReviewBookings));

    match allowed {
        Some(Ok(())) => Ok(next.run(req).await),
        Some(Err(err)) => Err(err.into_api(false).into_response()),
        None => Err(AppError::Unauthorized("No token provided".to_string())
            .into_api(false)
            .into_response()),
    }
}
