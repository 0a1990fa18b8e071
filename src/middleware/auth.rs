//! Middleware de autenticación
//!
//! Extrae la identidad actuante del token Bearer y la deja en las
//! extensiones del request. La emisión de tokens es externa; aquí solo
//! se verifica la firma y se leen los claims.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::models::user::{ActingUser, UserRole};
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{extract_token_from_header, verify_token, JwtConfig};

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &JwtConfig::from(&state.config))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Jwt("Token subject is not a valid user id".to_string()))?;
    let role = UserRole::parse(&claims.role)
        .ok_or_else(|| AppError::Jwt(format!("Unknown role '{}' in token", claims.role)))?;

    request.extensions_mut().insert(ActingUser { id: user_id, role });

    Ok(next.run(request).await)
}
