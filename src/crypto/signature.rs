use std::str::FromStr;

use ethers::types::{ Address, Signature };

use crate::error::{ AppError, Result };

/// Random hex nonce bound to a wallet for a single login challenge.
pub fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Parse an EVM address and return its canonical lower-case `0x` form.
pub fn normalize_address(address: &str) -> Result<String> {
    let parsed: Address = address.trim().parse().map_err(|_| AppError::InvalidAddress)?;
    Ok(format!("{:?}", parsed))
}

/// The exact text the wallet is asked to sign.
pub fn login_message(address: &str, nonce: &str) -> String {
    format!(
        "Welcome to Launchpad!\n\nSign this message to prove you own this wallet. \
         It will not trigger a blockchain transaction or cost any gas.\n\n\
         Wallet: {}\nNonce: {}",
        address,
        nonce
    )
}

/// Recover the EIP-191 signer of `message` and require it to be `claimed_address`.
pub fn verify_signature(message: &str, signature: &str, claimed_address: &str) -> Result<()> {
    let claimed: Address = claimed_address.trim().parse().map_err(|_| AppError::InvalidAddress)?;

    let signature = Signature::from_str(signature.trim()).map_err(|_| AppError::InvalidSignature)?;
    let recovered = signature.recover(message).map_err(|_| AppError::InvalidSignature)?;

    if recovered != claimed {
        tracing::debug!(
            claimed = ?claimed,
            recovered = ?recovered,
            "Signature recovered to a different address"
        );
        return Err(AppError::InvalidSignature);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{ LocalWallet, Signer };

    fn random_wallet() -> LocalWallet {
        LocalWallet::new(&mut ethers::core::rand::thread_rng())
    }

    #[test]
    fn test_nonce_is_random_hex() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), 32);
        assert!(hex::decode(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_normalize_address() {
        let normalized = normalize_address("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0").unwrap();
        assert_eq!(normalized, "0x742d35cc6634c0532925a3b844bc9e7595f0beb0");
        assert!(matches!(normalize_address("0x123"), Err(AppError::InvalidAddress)));
    }

    #[tokio::test]
    async fn test_accepts_signature_from_claimed_wallet() {
        let wallet = random_wallet();
        let address = format!("{:?}", wallet.address());
        let message = login_message(&address, &generate_nonce());

        let signature = wallet.sign_message(&message).await.unwrap();

        assert!(verify_signature(&message, &signature.to_string(), &address).is_ok());
        assert!(verify_signature(&message, &format!("0x{}", signature), &address).is_ok());
    }

    #[tokio::test]
    async fn test_rejects_signature_from_other_wallet() {
        let claimed = random_wallet();
        let impostor = random_wallet();
        let address = format!("{:?}", claimed.address());
        let message = login_message(&address, &generate_nonce());

        let signature = impostor.sign_message(&message).await.unwrap();

        assert!(matches!(
            verify_signature(&message, &signature.to_string(), &address),
            Err(AppError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn test_rejects_signature_over_other_nonce() {
        let wallet = random_wallet();
        let address = format!("{:?}", wallet.address());
        let signed = login_message(&address, "aaaa");
        let expected = login_message(&address, "bbbb");

        let signature = wallet.sign_message(&signed).await.unwrap();

        assert!(verify_signature(&expected, &signature.to_string(), &address).is_err());
    }

    #[test]
    fn test_rejects_garbage_signature() {
        let result = verify_signature(
            "hello",
            "0xdeadbeef",
            "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0"
        );
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }
}
