//! Deployment pipeline: validate, run the toolchain, verify, snapshot.
//!
//! The toolchain (a Hardhat-style project) is an external program. We hand it
//! a JSON parameter blob, let it compile and broadcast, and read back a single
//! JSON result line from its stdout.

pub mod factory;
pub mod runner;
pub mod snapshot;
pub mod validation;
pub mod verifier;

pub use factory::FactoryRegistry;
pub use runner::{ DeployInvocation, DeployRunner, DeploymentResult, ScriptRunner };
pub use snapshot::{ DeploymentSnapshot, SnapshotWriter };
pub use validation::{
    PresaleDeployRequest,
    TokenDeployRequest,
    ValidatedPresale,
    ValidatedToken,
    VestingRequest,
};
pub use verifier::{ verify_with_retry, ContractVerifier, ScriptVerifier, VerificationOutcome, VerifyRequest };

use serde::{ Deserialize, Deserializer };

/// Accept a JSON string or number and keep it as a decimal string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where D: Deserializer<'de>
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number, got {}", other))),
    }
}

pub(crate) fn opt_string_or_number<'de, D>(
    deserializer: D
) -> std::result::Result<Option<String>, D::Error>
    where D: Deserializer<'de>
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) =>
            Err(serde::de::Error::custom(format!("expected string or number, got {}", other))),
    }
}
