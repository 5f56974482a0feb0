use axum::{
    extract::{ FromRequestParts, State },
    http::{ header, request::Parts, HeaderMap },
    Json,
};
use serde::Deserialize;

use crate::error::{ AppError, Result };
use crate::services::auth_service::{ LoginChallenge, LoginRequest, LoginResponse, SessionInfo };

use super::{ ApiJson, ApiQuery, AppState };

/// The wallet behind a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub address: String,
}

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Expected a Bearer token".to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.auth_service.verify_token(token)?;
        Ok(AuthUser { address: claims.sub })
    }
}

#[derive(Deserialize)]
pub struct MessageQuery {
    pub address: String,
}

pub async fn get_message(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MessageQuery>
) -> Result<Json<LoginChallenge>> {
    let challenge = state.auth_service.issue_challenge(&query.address).await?;
    Ok(Json(challenge))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>
) -> Result<Json<LoginResponse>> {
    let response = state.auth_service.login(&request).await?;
    Ok(Json(response))
}

pub async fn verify(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionInfo>> {
    let token = bearer_token(&headers)?;
    Ok(Json(state.auth_service.session_info(token)?))
}
