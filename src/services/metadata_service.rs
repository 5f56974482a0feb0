use std::time::Duration;

use serde::{ Deserialize, Serialize };
use serde_json::json;
use tracing::{ info, warn };

use crate::config::IpfsConfig;
use crate::crypto::signature::normalize_address;
use crate::db::TokenDeploymentRepository;
use crate::enums::Network;
use crate::error::{ AppError, Result };

const MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Public token metadata document as stored on IPFS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMetadataRequest {
    #[serde(flatten)]
    pub metadata: TokenMetadata,
    /// Attach the pinned URI to this token (requires `network`).
    pub token_address: Option<String>,
    pub network: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinMetadataResponse {
    pub cid: String,
    pub uri: String,
    pub gateway_url: String,
    pub attached_to: Option<String>,
}

#[derive(Deserialize)]
struct PinataPinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

pub struct MetadataService {
    client: reqwest::Client,
    config: IpfsConfig,
    tokens: TokenDeploymentRepository,
    retry_backoff: Duration,
}

impl MetadataService {
    pub fn new(config: IpfsConfig, tokens: TokenDeploymentRepository) -> Result<Self> {
        let client = reqwest::Client
            ::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            tokens,
            retry_backoff: DEFAULT_BACKOFF,
        })
    }

    /// Base delay between pin attempts; attempt `n` waits `n * backoff`.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub async fn pin(&self, caller: &str, request: &PinMetadataRequest) -> Result<PinMetadataResponse> {
        validate_metadata(&request.metadata)?;

        // Ownership is checked before anything is pinned
        let target = match (&request.network, &request.token_address) {
            (Some(network), Some(address)) => {
                let network: Network = network.parse()?;
                let address = normalize_address(address)?;
                let token = self.tokens
                    .find_by_network_and_address(network.as_str(), &address).await?
                    .ok_or_else(|| AppError::NotFound("Token".to_string()))?;
                if token.owner_address != caller.to_lowercase() {
                    return Err(AppError::Forbidden("Only the token owner can set its metadata".to_string()));
                }
                Some(token)
            }
            (None, None) => None,
            _ => {
                return Err(
                    AppError::InvalidInput("network and tokenAddress must be given together".to_string())
                );
            }
        };

        let cid = self.pin_json(&request.metadata).await?;
        let uri = format!("ipfs://{}", cid);
        info!(cid = %cid, symbol = %request.metadata.symbol, "Token metadata pinned");

        let attached_to = match target {
            Some(token) => {
                let token = self.tokens.set_metadata_uri(token.id, uri.clone()).await?;
                Some(token.contract_address)
            }
            None => None,
        };

        Ok(PinMetadataResponse {
            gateway_url: self.gateway_url(&cid),
            cid,
            uri,
            attached_to,
        })
    }

    async fn pin_json(&self, metadata: &TokenMetadata) -> Result<String> {
        let jwt = self.config.pinata_jwt
            .as_deref()
            .ok_or_else(|| AppError::Config("IPFS pinning is not configured (PINATA_JWT)".to_string()))?;

        let url = format!("{}/pinning/pinJSONToIPFS", self.config.pinata_api_url.trim_end_matches('/'));
        let body =
            json!({
            "pinataContent": metadata,
            "pinataMetadata": { "name": format!("{}-metadata.json", metadata.symbol) },
        });

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(self.retry_backoff * (attempt - 1)).await;
            }

            let response = match self.client.post(&url).bearer_auth(jwt).json(&body).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "Pinning request failed");
                    last_err = Some(AppError::External(format!("IPFS pinning request failed: {}", e)));
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                warn!(attempt, status = %status, "Pinning service unavailable");
                last_err = Some(AppError::External(format!("IPFS pinning returned status: {}", status)));
                continue;
            }
            if !status.is_success() {
                return Err(AppError::External(format!("IPFS pinning returned status: {}", status)));
            }

            let pinned: PinataPinResponse = response
                .json().await
                .map_err(|e| AppError::External(format!("Failed to parse pinning response: {}", e)))?;
            return Ok(pinned.ipfs_hash);
        }

        Err(last_err.unwrap_or_else(|| AppError::External("IPFS pinning failed after retries".to_string())))
    }

    /// Fetch a metadata document through the configured gateway.
    pub async fn fetch(&self, cid: &str) -> Result<serde_json::Value> {
        let cid = cid.trim().trim_start_matches("ipfs://");
        if cid.is_empty() || !cid.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidInput(format!("Invalid IPFS CID: {}", cid)));
        }

        let response = self.client
            .get(self.gateway_url(cid))
            .send().await
            .map_err(|e| AppError::External(format!("IPFS gateway error: {}", e)))?;

        match response.status() {
            s if s.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => {
                return Err(AppError::NotFound("Metadata".to_string()));
            }
            s => {
                return Err(AppError::External(format!("IPFS gateway returned status: {}", s)));
            }
        }

        response
            .json().await
            .map_err(|e| AppError::External(format!("Metadata is not valid JSON: {}", e)))
    }

    fn gateway_url(&self, cid: &str) -> String {
        format!("{}/{}", self.config.gateway_url.trim_end_matches('/'), cid)
    }
}

fn validate_metadata(metadata: &TokenMetadata) -> Result<()> {
    if metadata.name.trim().is_empty() {
        return Err(AppError::InvalidInput("name must not be empty".to_string()));
    }
    if metadata.symbol.trim().is_empty() {
        return Err(AppError::InvalidInput("symbol must not be empty".to_string()));
    }
    if metadata.description.as_deref().map_or(0, |d| d.chars().count()) > MAX_DESCRIPTION_LEN {
        return Err(
            AppError::InvalidInput(format!("description must be at most {} characters", MAX_DESCRIPTION_LEN))
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ test_connection, NewTokenDeployment };
    use crate::enums::VerificationStatus;
    use axum::{ extract::State, http::StatusCode, routing::{ get, post }, Json, Router };
    use std::sync::atomic::{ AtomicUsize, Ordering };
    use std::sync::Arc;

    const OWNER: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
    const TOKEN: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    /// Pinata stand-in that fails the first `failures` pins with a 503.
    async fn pinning_server(failures: usize) -> (String, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));

        async fn pin(
            State((calls, failures)): State<(Arc<AtomicUsize>, usize)>,
            Json(body): Json<serde_json::Value>
        ) -> (StatusCode, Json<serde_json::Value>) {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < failures || body["pinataContent"]["symbol"].is_null() {
                return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
            }
            (StatusCode::OK, Json(json!({ "IpfsHash": CID })))
        }

        async fn gateway() -> Json<serde_json::Value> {
            Json(json!({ "name": "Moon", "symbol": "MOON" }))
        }

        let app = Router::new()
            .route("/pinning/pinJSONToIPFS", post(pin))
            .route(&format!("/ipfs/{}", CID), get(gateway))
            .with_state((calls.clone(), failures));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), calls)
    }

    async fn service(base_url: &str, jwt: Option<&str>) -> (MetadataService, TokenDeploymentRepository) {
        let db = test_connection().await;
        let tokens = TokenDeploymentRepository::new(db);
        let config = IpfsConfig {
            pinata_jwt: jwt.map(str::to_string),
            pinata_api_url: base_url.to_string(),
            gateway_url: format!("{}/ipfs", base_url),
        };
        let service = MetadataService::new(config, tokens.clone())
            .unwrap()
            .with_retry_backoff(Duration::from_millis(1));
        (service, tokens)
    }

    fn metadata() -> TokenMetadata {
        TokenMetadata {
            name: "Moon".to_string(),
            symbol: "MOON".to_string(),
            description: Some("To the moon".to_string()),
            image: None,
            website: Some("https://moon.example".to_string()),
            twitter: None,
            telegram: None,
            discord: None,
        }
    }

    fn request(network: Option<&str>, token: Option<&str>) -> PinMetadataRequest {
        PinMetadataRequest {
            metadata: metadata(),
            network: network.map(str::to_string),
            token_address: token.map(str::to_string),
        }
    }

    async fn insert_token(tokens: &TokenDeploymentRepository) {
        tokens
            .create(NewTokenDeployment {
                network: Network::Sepolia.as_str().to_string(),
                contract_address: TOKEN.to_string(),
                contract_type: "standard".to_string(),
                name: "Moon".to_string(),
                symbol: "MOON".to_string(),
                decimals: 18,
                total_supply: "1000".to_string(),
                owner_address: OWNER.to_string(),
                constructor_args: json!([]),
                tx_hash: "0xaa".to_string(),
                gas_used: None,
                is_burnable: false,
                is_mintable: false,
                has_fee: false,
                has_redistribution: false,
                fee_percent: None,
                redistribution_percent: None,
                verification_status: VerificationStatus::Skipped,
                metadata_uri: None,
            }).await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pin_retries_then_attaches() {
        let (base_url, calls) = pinning_server(2).await;
        let (service, tokens) = service(&base_url, Some("jwt")).await;
        insert_token(&tokens).await;

        let response = service.pin(OWNER, &request(Some("sepolia"), Some(TOKEN))).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(response.uri, format!("ipfs://{}", CID));
        assert_eq!(response.attached_to.as_deref(), Some(TOKEN));

        let token = tokens.find_by_network_and_address("SEPOLIA", TOKEN).await.unwrap().unwrap();
        assert_eq!(token.metadata_uri, Some(format!("ipfs://{}", CID)));
    }

    #[tokio::test]
    async fn test_pin_gives_up_after_three_attempts() {
        let (base_url, calls) = pinning_server(10).await;
        let (service, _) = service(&base_url, Some("jwt")).await;

        let err = service.pin(OWNER, &request(None, None)).await.unwrap_err();
        assert!(matches!(err, AppError::External(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_only_owner_can_attach() {
        let (base_url, calls) = pinning_server(0).await;
        let (service, tokens) = service(&base_url, Some("jwt")).await;
        insert_token(&tokens).await;

        let stranger = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";
        let err = service.pin(stranger, &request(Some("sepolia"), Some(TOKEN))).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let unknown = "0x9fe46736679d2d9a65f0992f2272de9f3c7fa6e0";
        let err = service.pin(OWNER, &request(Some("sepolia"), Some(unknown))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pinning_requires_configuration() {
        let (service, _) = service("http://127.0.0.1:9", None).await;
        let err = service.pin(OWNER, &request(None, None)).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_fetch_through_gateway() {
        let (base_url, _) = pinning_server(0).await;
        let (service, _) = service(&base_url, None).await;

        let doc = service.fetch(CID).await.unwrap();
        assert_eq!(doc["symbol"], "MOON");

        let missing = service.fetch("QmMissing").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        assert!(matches!(service.fetch("../etc/passwd").await, Err(AppError::InvalidInput(_))));
    }
}
