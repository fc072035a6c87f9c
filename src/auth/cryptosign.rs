//! WAMP-Cryptosign (`cryptosign`) Ed25519 challenge-response.
//!
//! The router sends a hex nonce in `extra.challenge`. The client signs the
//! raw nonce bytes and answers with `hex(signature || nonce)`: the fixed
//! 64-byte signature first, then the nonce, so a verifier needs nothing but
//! the blob and the public key.

use std::fmt;

use async_trait::async_trait;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde_json::Value;
use zeroize::Zeroizing;

use super::{challenge_string, AuthError, ClientAuthenticator};
use crate::messages::{Authenticate, Challenge, Dict};

const SIGNATURE_SIZE: usize = 64;
const SEED_SIZE: usize = 32;
const CHALLENGE_SIZE: usize = 32;

/// `cryptosign` authenticator holding an Ed25519 seed.
#[derive(Clone)]
pub struct CryptoSignAuthenticator {
    authid: String,
    signing_key: SigningKey,
    authextra: Dict,
}

impl CryptoSignAuthenticator {
    /// Create a cryptosign authenticator from a 64-character hex seed.
    ///
    /// If `authextra` has no `pubkey` entry, the hex public key derived from
    /// the seed is inserted.
    pub fn new(
        authid: impl Into<String>,
        private_key_hex: &str,
        authextra: Option<Dict>,
    ) -> Result<Self, AuthError> {
        let signing_key = signing_key_from_hex(private_key_hex)?;

        let mut authextra = authextra.unwrap_or_default();
        if !authextra.contains_key("pubkey") {
            let pubkey = hex::encode(signing_key.verifying_key().to_bytes());
            authextra.insert("pubkey".to_string(), Value::String(pubkey));
        }

        Ok(Self {
            authid: authid.into(),
            signing_key,
            authextra,
        })
    }

    /// Public key matching the configured seed
    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }
}

impl fmt::Debug for CryptoSignAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoSignAuthenticator")
            .field("authid", &self.authid)
            .field("private_key", &"[REDACTED]")
            .field("authextra", &self.authextra)
            .finish()
    }
}

#[async_trait]
impl ClientAuthenticator for CryptoSignAuthenticator {
    fn auth_method(&self) -> &str {
        "cryptosign"
    }

    fn auth_id(&self) -> &str {
        &self.authid
    }

    fn auth_extra(&self) -> Option<&Dict> {
        Some(&self.authextra)
    }

    async fn authenticate(&self, challenge: &Challenge) -> Result<Authenticate, AuthError> {
        let challenge_hex = challenge_string(challenge)?;
        let signed = sign_with_key(&self.signing_key, challenge_hex)?;
        Ok(Authenticate::new(signed, Dict::new()))
    }
}

fn signing_key_from_hex(private_key_hex: &str) -> Result<SigningKey, AuthError> {
    if private_key_hex.len() != SEED_SIZE * 2 {
        return Err(AuthError::InvalidPrivateKeyLength);
    }

    let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
    hex::decode_to_slice(private_key_hex, seed.as_mut_slice())?;
    Ok(SigningKey::from_bytes(&seed))
}

fn sign_with_key(signing_key: &SigningKey, challenge_hex: &str) -> Result<String, AuthError> {
    let nonce = hex::decode(challenge_hex)?;
    let signature = signing_key.sign(&nonce);

    let mut output = Vec::with_capacity(SIGNATURE_SIZE + nonce.len());
    output.extend_from_slice(&signature.to_bytes());
    output.extend_from_slice(&nonce);
    Ok(hex::encode(output))
}

/// Sign a hex challenge with a hex Ed25519 seed, returning `hex(signature || nonce)`.
pub fn sign_cryptosign_challenge(challenge_hex: &str, private_key_hex: &str) -> Result<String, AuthError> {
    let signing_key = signing_key_from_hex(private_key_hex)?;
    sign_with_key(&signing_key, challenge_hex)
}

/// Random 32-byte challenge, hex encoded.
pub fn generate_cryptosign_challenge() -> String {
    generate_cryptosign_challenge_with_rng(&mut OsRng)
}

/// [`generate_cryptosign_challenge`] with an injected random source.
pub fn generate_cryptosign_challenge_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut challenge = [0u8; CHALLENGE_SIZE];
    rng.fill_bytes(&mut challenge);
    hex::encode(challenge)
}

/// Verify a `hex(signature || nonce)` blob against a raw 32-byte public key.
///
/// Malformed hex, a blob shorter than a signature, or an invalid public key
/// all yield `false`.
pub fn verify_cryptosign_signature(signature_hex: &str, public_key: &[u8]) -> bool {
    let Ok(signed) = hex::decode(signature_hex) else {
        return false;
    };
    if signed.len() < SIGNATURE_SIZE {
        return false;
    }
    let (signature, nonce) = signed.split_at(SIGNATURE_SIZE);

    let Ok(verifying_key) = VerifyingKey::try_from(public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };

    verifying_key.verify(nonce, &signature).is_ok()
}
