use std::sync::Arc;

use chrono::{ DateTime, Duration, Utc };
use serde::{ Deserialize, Serialize };
use tracing::{ debug, info, warn };

use crate::crypto::signature::{ generate_nonce, login_message, normalize_address, verify_signature };
use crate::crypto::{ Claims, JwtManager };
use crate::db::UserRepository;
use crate::enums::Network;
use crate::error::{ AppError, Result };
use crate::rpc::RpcManager;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginChallenge {
    pub address: String,
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub address: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub address: String,
    pub expires_at: DateTime<Utc>,
    pub token_balance: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub valid: bool,
    pub address: String,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService {
    users: UserRepository,
    jwt: JwtManager,
    nonce_ttl: Duration,
    rpc_manager: Arc<RpcManager>,
    platform_token: Option<(Network, String)>,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        jwt: JwtManager,
        nonce_ttl_secs: i64,
        rpc_manager: Arc<RpcManager>,
        platform_token: Option<(Network, String)>
    ) -> Self {
        Self {
            users,
            jwt,
            nonce_ttl: Duration::seconds(nonce_ttl_secs),
            rpc_manager,
            platform_token,
        }
    }

    /// Create (or refresh) the user's nonce and return the message to sign.
    pub async fn issue_challenge(&self, address: &str) -> Result<LoginChallenge> {
        let address = normalize_address(address)?;
        let user = self.users.upsert_nonce(&address, &generate_nonce()).await?;

        Ok(LoginChallenge {
            message: login_message(&user.address, &user.nonce),
            expires_at: user.nonce_issued_at + self.nonce_ttl,
            address: user.address,
            nonce: user.nonce,
        })
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let address = normalize_address(&request.address)?;

        let user = self.users
            .find_by_address(&address).await?
            .ok_or_else(|| AppError::Unauthorized("Request a login message first".to_string()))?;

        if Utc::now() - user.nonce_issued_at >= self.nonce_ttl {
            return Err(AppError::Unauthorized("Login message expired, request a new one".to_string()));
        }

        let message = login_message(&user.address, &user.nonce);
        verify_signature(&message, &request.signature, &address)?;

        let token_balance = self.platform_token_balance(&address).await;
        let user = self.users.record_login(user, &generate_nonce(), token_balance).await?;

        let (token, claims) = self.jwt.issue(&user.address)?;
        info!(address = %user.address, "Wallet signed in");

        Ok(LoginResponse {
            token,
            address: user.address,
            expires_at: claims.expires_at(),
            token_balance: user.token_balance,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        self.jwt.validate(token)
    }

    pub fn session_info(&self, token: &str) -> Result<SessionInfo> {
        let claims = self.verify_token(token)?;
        Ok(SessionInfo {
            valid: true,
            expires_at: claims.expires_at(),
            address: claims.sub,
        })
    }

    /// Balance of the configured platform token; failures only cost the cache refresh.
    async fn platform_token_balance(&self, address: &str) -> Option<String> {
        let (network, token) = self.platform_token.as_ref()?;

        let provider = match self.rpc_manager.get_provider(*network).await {
            Ok(provider) => provider,
            Err(e) => {
                debug!(error = %e, "Platform token network unavailable");
                return None;
            }
        };

        match provider.get_token_balance(token, address).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(address = %address, error = %e, "Failed to refresh platform token balance");
                let _ = self.rpc_manager.rotate_provider(*network).await;
                None
            }
        }
    }
}
