use axum::{ extract::State, Json };
use serde::Deserialize;

use crate::crypto::signature::normalize_address;
use crate::db::DeploymentFilter;
use crate::enums::{ Network, PresaleStatus };
use crate::error::Result;
use crate::services::contract_service::{ MyDeployments, PresaleView, TokenView };

use super::auth::AuthUser;
use super::{ ApiPath, ApiQuery, AppState };

#[derive(Deserialize)]
pub struct ListQuery {
    pub network: Option<String>,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ListQuery {
    fn into_filter(self) -> Result<DeploymentFilter> {
        let network = self.network
            .as_deref()
            .map(|n| n.parse::<Network>().map(|n| n.as_str().to_string()))
            .transpose()?;
        let owner = self.owner.as_deref().map(normalize_address).transpose()?;
        let status = self.status
            .as_deref()
            .map(str::parse::<PresaleStatus>)
            .transpose()?;

        Ok(DeploymentFilter {
            network,
            owner,
            status,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Deserialize)]
pub struct ContractPath {
    pub network: String,
    pub address: String,
}

pub async fn list_tokens(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>
) -> Result<Json<Vec<TokenView>>> {
    let tokens = state.contract_service.list_tokens(&query.into_filter()?).await?;
    Ok(Json(tokens))
}

pub async fn get_token(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<ContractPath>
) -> Result<Json<TokenView>> {
    let token = state.contract_service.get_token(&path.network, &path.address).await?;
    Ok(Json(token))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(path): ApiPath<ContractPath>
) -> Result<Json<TokenView>> {
    let token = state.contract_service.refresh_token(&path.network, &path.address).await?;
    Ok(Json(token))
}

pub async fn list_presales(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>
) -> Result<Json<Vec<PresaleView>>> {
    let presales = state.contract_service.list_presales(&query.into_filter()?).await?;
    Ok(Json(presales))
}

pub async fn get_presale(
    State(state): State<AppState>,
    ApiPath(path): ApiPath<ContractPath>
) -> Result<Json<PresaleView>> {
    let presale = state.contract_service.get_presale(&path.network, &path.address).await?;
    Ok(Json(presale))
}

pub async fn refresh_presale(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(path): ApiPath<ContractPath>
) -> Result<Json<PresaleView>> {
    let presale = state.contract_service.refresh_presale(&path.network, &path.address).await?;
    Ok(Json(presale))
}

pub async fn my_deployments(
    State(state): State<AppState>,
    user: AuthUser
) -> Result<Json<MyDeployments>> {
    let deployments = state.contract_service.my_deployments(&user.address).await?;
    Ok(Json(deployments))
}
