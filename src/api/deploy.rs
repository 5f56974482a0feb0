use axum::{ extract::State, http::StatusCode, Json };
use serde::Deserialize;

use crate::deploy::{ PresaleDeployRequest, TokenDeployRequest };
use crate::error::Result;
use crate::services::deployment_service::{
    DeploymentResponse,
    DeploymentStatusResponse,
    EstimateRequest,
    EstimateResponse,
};

use super::auth::AuthUser;
use super::{ ApiJson, ApiPath, ApiQuery, AppState };

pub async fn deploy_token(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<TokenDeployRequest>
) -> Result<(StatusCode, Json<DeploymentResponse>)> {
    let response = state.deployment_service.deploy_token(&user.address, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn deploy_presale(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<PresaleDeployRequest>
) -> Result<(StatusCode, Json<DeploymentResponse>)> {
    let response = state.deployment_service.deploy_presale(&user.address, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub network: Option<String>,
}

pub async fn get_status(
    State(state): State<AppState>,
    ApiPath(tx_hash): ApiPath<String>,
    ApiQuery(query): ApiQuery<StatusQuery>
) -> Result<Json<DeploymentStatusResponse>> {
    let status = state.deployment_service.get_deployment_status(
        &tx_hash,
        query.network.as_deref()
    ).await?;

    Ok(Json(status))
}

pub async fn estimate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EstimateRequest>
) -> Result<Json<EstimateResponse>> {
    let estimate = state.deployment_service.estimate(&request).await?;
    Ok(Json(estimate))
}
