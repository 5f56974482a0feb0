use std::sync::Arc;

use axum::{
    extract::{
        rejection::{ JsonRejection, PathRejection, QueryRejection },
        FromRequest,
        FromRequestParts,
        Path,
        Query,
        Request,
    },
    http::request::Parts,
    routing::{ get, post },
    Json,
    Router,
};
use serde::de::DeserializeOwned;
use tower_http::{ cors::CorsLayer, trace::TraceLayer };

pub mod auth;
pub mod contracts;
pub mod deploy;
pub mod metadata;

use crate::error::AppError;
use crate::services::{ AuthService, ContractService, DeploymentService, MetadataService };

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub deployment_service: Arc<DeploymentService>,
    pub contract_service: Arc<ContractService>,
    pub metadata_service: Arc<MetadataService>,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        deployment_service: Arc<DeploymentService>,
        contract_service: Arc<ContractService>,
        metadata_service: Arc<MetadataService>
    ) -> Self {
        Self {
            auth_service,
            deployment_service,
            contract_service,
            metadata_service,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/message", get(auth::get_message))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/deploy/token", post(deploy::deploy_token))
        .route("/api/deploy/presale", post(deploy::deploy_presale))
        .route("/api/deploy/status/{tx_hash}", get(deploy::get_status))
        .route("/api/deploy/estimate", post(deploy::estimate))
        .route("/api/contracts/tokens", get(contracts::list_tokens))
        .route("/api/contracts/tokens/{network}/{address}", get(contracts::get_token))
        .route("/api/contracts/tokens/{network}/{address}/refresh", post(contracts::refresh_token))
        .route("/api/contracts/presales", get(contracts::list_presales))
        .route("/api/contracts/presales/{network}/{address}", get(contracts::get_presale))
        .route(
            "/api/contracts/presales/{network}/{address}/refresh",
            post(contracts::refresh_presale)
        )
        .route("/api/contracts/mine", get(contracts::my_deployments))
        .route("/api/token-metadata", post(metadata::pin_metadata))
        .route("/api/token-metadata/{cid}", get(metadata::get_metadata))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}

/// `Json` whose rejections use the API's error body instead of axum's plain text.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T> where T: DeserializeOwned, S: Send + Sync {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>
            ::from_request(req, state).await
            .map_err(|e: JsonRejection| AppError::InvalidInput(e.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` with the same error body as `ApiJson`.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T> where T: DeserializeOwned, S: Send + Sync {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>
            ::from_request_parts(parts, state).await
            .map_err(|e: QueryRejection| AppError::InvalidInput(e.body_text()))?;
        Ok(Self(value))
    }
}

pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T> where T: DeserializeOwned + Send, S: Send + Sync {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>
            ::from_request_parts(parts, state).await
            .map_err(|e: PathRejection| AppError::InvalidInput(e.body_text()))?;
        Ok(Self(value))
    }
}
