use axum::{ extract::State, http::StatusCode, Json };

use crate::error::Result;
use crate::services::metadata_service::{ PinMetadataRequest, PinMetadataResponse };

use super::auth::AuthUser;
use super::{ ApiJson, ApiPath, AppState };

pub async fn pin_metadata(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<PinMetadataRequest>
) -> Result<(StatusCode, Json<PinMetadataResponse>)> {
    let pinned = state.metadata_service.pin(&user.address, &request).await?;
    Ok((StatusCode::CREATED, Json(pinned)))
}

pub async fn get_metadata(
    State(state): State<AppState>,
    ApiPath(cid): ApiPath<String>
) -> Result<Json<serde_json::Value>> {
    let document = state.metadata_service.fetch(&cid).await?;
    Ok(Json(document))
}
