//! WAMP Challenge-Response Authentication (`wampcra`).
//!
//! The router sends a JSON challenge string in `extra.challenge`. The client
//! answers with `base64(HMAC-SHA256(key, challenge))` where `key` is either
//! the raw secret or, when the router supplies a salt, the base64 text of
//! `PBKDF2-HMAC-SHA256(secret, salt, iterations, keylen)` used as UTF-8 bytes.

use std::fmt;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde_json::Value;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{challenge_string, AuthError, ClientAuthenticator};
use crate::messages::{Authenticate, Challenge, Dict};

type HmacSha256 = Hmac<Sha256>;

const AUTH_METHOD: &str = "wampcra";

/// PBKDF2 iteration count used when the router sends `iterations: 0`
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Derived key length in bytes (256 bits) used when the router sends `keylen: 0`
pub const DEFAULT_KEY_LENGTH: usize = 32;

/// Largest PBKDF2 iteration count accepted from a router
pub const MAX_ITERATIONS: u64 = 10_000_000;

/// Largest derived key length in bytes accepted from a router
pub const MAX_KEY_LENGTH: usize = 1024;

const NONCE_SIZE: usize = 16;

/// `wampcra` authenticator holding a shared secret.
#[derive(Clone)]
pub struct WampCraAuthenticator {
    authid: String,
    secret: Zeroizing<String>,
    authextra: Option<Dict>,
}

impl WampCraAuthenticator {
    /// Create a WAMP-CRA authenticator
    pub fn new(authid: impl Into<String>, secret: impl Into<String>, authextra: Option<Dict>) -> Self {
        Self {
            authid: authid.into(),
            secret: Zeroizing::new(secret.into()),
            authextra,
        }
    }

    /// Resolve the HMAC key for this challenge (raw or salted).
    fn signing_key(&self, extra: &Dict) -> Result<Zeroizing<Vec<u8>>, AuthError> {
        let salt = match extra.get("salt") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.as_str()),
            Some(other) => {
                return Err(AuthError::InvalidChallenge(format!(
                    "salt must be a string, got {other}"
                )))
            },
        };

        let Some(salt) = salt else {
            return Ok(Zeroizing::new(self.secret.as_bytes().to_vec()));
        };

        let iterations = derivation_param(extra, "iterations", MAX_ITERATIONS, AuthError::IterationsMissing)?;
        let keylen = derivation_param(extra, "keylen", MAX_KEY_LENGTH as u64, AuthError::KeyLengthMissing)?;

        let iterations = u32::try_from(iterations)
            .map_err(|_| AuthError::InvalidChallenge(format!("iterations out of range: {iterations}")))?;
        let keylen = usize::try_from(keylen)
            .map_err(|_| AuthError::InvalidChallenge(format!("keylen out of range: {keylen}")))?;

        Ok(derive_cra_key(&self.secret, salt, iterations, keylen))
    }
}

/// Read a PBKDF2 parameter from the challenge extra.
///
/// Non-numeric values count as missing. Whole-number floats are accepted;
/// fractional, negative or above-`max` values are rejected.
fn derivation_param(extra: &Dict, name: &str, max: u64, missing: AuthError) -> Result<u64, AuthError> {
    let Some(Value::Number(number)) = extra.get(name) else {
        return Err(missing);
    };

    let value = match number.as_u64() {
        Some(value) => Some(value),
        None => number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= max as f64)
            .map(|f| f as u64),
    };

    match value {
        Some(value) if value <= max => Ok(value),
        _ => Err(AuthError::InvalidChallenge(format!(
            "{name} must be a whole number between 0 and {max}, got {number}"
        ))),
    }
}

impl fmt::Debug for WampCraAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WampCraAuthenticator")
            .field("authid", &self.authid)
            .field("secret", &"[REDACTED]")
            .field("authextra", &self.authextra)
            .finish()
    }
}

#[async_trait]
impl ClientAuthenticator for WampCraAuthenticator {
    fn auth_method(&self) -> &str {
        AUTH_METHOD
    }

    fn auth_id(&self) -> &str {
        &self.authid
    }

    fn auth_extra(&self) -> Option<&Dict> {
        self.authextra.as_ref()
    }

    async fn authenticate(&self, challenge: &Challenge) -> Result<Authenticate, AuthError> {
        let challenge_str = challenge_string(challenge)?;
        let key = self.signing_key(&challenge.extra)?;
        let signature = sign_wampcra_challenge(challenge_str, &key)?;
        Ok(Authenticate::new(signature, Dict::new()))
    }
}

/// Derive the salted WAMP-CRA key.
///
/// Returns the standard base64 text of the PBKDF2 output as bytes; that text,
/// not the raw derived bytes, is the HMAC key peers expect. Zero `iterations`
/// or `key_len` fall back to [`DEFAULT_ITERATIONS`] / [`DEFAULT_KEY_LENGTH`].
pub fn derive_cra_key(secret: &str, salt: &str, iterations: u32, key_len: usize) -> Zeroizing<Vec<u8>> {
    let iterations = if iterations == 0 { DEFAULT_ITERATIONS } else { iterations };
    let key_len = if key_len == 0 { DEFAULT_KEY_LENGTH } else { key_len };

    let mut derived = Zeroizing::new(vec![0u8; key_len]);
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt.as_bytes(), iterations, &mut derived);

    Zeroizing::new(STANDARD.encode(derived.as_slice()).into_bytes())
}

/// Sign a challenge string: `base64(HMAC-SHA256(key, challenge))`.
pub fn sign_wampcra_challenge(challenge: &str, key: &[u8]) -> Result<String, AuthError> {
    Ok(STANDARD.encode(hmac_digest(challenge, key)?))
}

/// Verify a WAMP-CRA signature in constant time.
///
/// Returns `false` for signatures that are not valid base64.
pub fn verify_wampcra_signature(signature: &str, challenge: &str, key: &[u8]) -> bool {
    let Ok(received) = STANDARD.decode(signature) else {
        return false;
    };
    let Ok(expected) = hmac_digest(challenge, key) else {
        return false;
    };
    constant_time_eq(&received, &expected)
}

/// Build a router-side challenge string with a fresh random nonce.
pub fn generate_wampcra_challenge(session_id: u64, authid: &str, authrole: &str, provider: &str) -> String {
    generate_wampcra_challenge_with_rng(&mut OsRng, session_id, authid, authrole, provider)
}

/// [`generate_wampcra_challenge`] with an injected random source.
pub fn generate_wampcra_challenge_with_rng<R: RngCore + CryptoRng>(
    rng: &mut R,
    session_id: u64,
    authid: &str,
    authrole: &str,
    provider: &str,
) -> String {
    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);

    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

    let mut data = Dict::new();
    data.insert("nonce".to_string(), Value::String(hex::encode(nonce)));
    data.insert("authprovider".to_string(), Value::from(provider));
    data.insert("authid".to_string(), Value::from(authid));
    data.insert("authrole".to_string(), Value::from(authrole));
    data.insert("authmethod".to_string(), Value::from(AUTH_METHOD));
    data.insert("session".to_string(), Value::from(session_id));
    data.insert("timestamp".to_string(), Value::String(timestamp));

    Value::Object(data).to_string()
}

fn hmac_digest(challenge: &str, key: &[u8]) -> Result<Vec<u8>, AuthError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    mac.update(challenge.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison: length first, then XOR-accumulate every byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use serde_json::json;

    const CRA_CHALLENGE: &str = r#"{"authid":"authid","authmethod":"wampcra","authprovider":"provider","authrole":"authrole","nonce":"VJ/iO7bpl5rCiRGJ7IGuQg==","session":12345,"timestamp":"2024-07-09T14:32:29+0500"}"#;

    fn challenge(extra: Value) -> Challenge {
        Challenge::new(AUTH_METHOD, extra.as_object().cloned().unwrap())
    }

    #[test]
    fn test_sign_known_vector() {
        let signature = sign_wampcra_challenge(CRA_CHALLENGE, b"secret").unwrap();
        assert_eq!(signature, "6JdymDadvf7Lk4IPP8+clJpqYDE5Dr5Y72vggrhVFao=");
    }

    #[test]
    fn test_derive_key_known_vector() {
        let key = derive_cra_key("secret", "salt123", 100, 16);
        assert_eq!(key.as_slice(), b"EX1Y3Q9BMM2oGLxsGqDgFQ==");
    }

    #[test]
    fn test_derive_key_zero_uses_defaults() {
        let defaults = derive_cra_key("secret", "salt123", 0, 0);
        let explicit = derive_cra_key("secret", "salt123", DEFAULT_ITERATIONS, DEFAULT_KEY_LENGTH);
        assert_eq!(defaults, explicit);
        assert_eq!(defaults.as_slice(), b"MDS8Yxpu4J/vkHJ8dNEgqECYsI0uRDh2oZ5eN0vYPvo=");
    }

    #[test]
    fn test_verify_roundtrip_and_tamper() {
        let signature = sign_wampcra_challenge(CRA_CHALLENGE, b"secret").unwrap();
        assert!(verify_wampcra_signature(&signature, CRA_CHALLENGE, b"secret"));

        let tampered = CRA_CHALLENGE.replacen("12345", "12346", 1);
        assert!(!verify_wampcra_signature(&signature, &tampered, b"secret"));
        assert!(!verify_wampcra_signature(&signature, CRA_CHALLENGE, b"secreT"));
        assert!(!verify_wampcra_signature("not base64!", CRA_CHALLENGE, b"secret"));
        assert!(!verify_wampcra_signature("", CRA_CHALLENGE, b"secret"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }

    #[tokio::test]
    async fn test_authenticate_unsalted() {
        let auth = WampCraAuthenticator::new("authid", "secret", None);
        assert_eq!(auth.auth_method(), "wampcra");
        assert!(auth.auth_extra().is_none());

        let authenticate = auth
            .authenticate(&challenge(json!({"challenge": CRA_CHALLENGE})))
            .await
            .unwrap();
        assert_eq!(authenticate.signature, "6JdymDadvf7Lk4IPP8+clJpqYDE5Dr5Y72vggrhVFao=");
    }

    #[tokio::test]
    async fn test_authenticate_salted() {
        let auth = WampCraAuthenticator::new("authid", "secret", None);
        let authenticate = auth
            .authenticate(&challenge(json!({
                "challenge": CRA_CHALLENGE,
                "salt": "salt123",
                "iterations": 100,
                "keylen": 16
            })))
            .await
            .unwrap();
        assert_eq!(authenticate.signature, "ECYA7DCKDhULQxdkRpvarrynyEM8yhxx6FgXiGc0ZfU=");

        let key = derive_cra_key("secret", "salt123", 100, 16);
        assert!(verify_wampcra_signature(&authenticate.signature, CRA_CHALLENGE, &key));
    }

    #[tokio::test]
    async fn test_authenticate_empty_salt_uses_raw_secret() {
        let auth = WampCraAuthenticator::new("authid", "secret", None);
        let authenticate = auth
            .authenticate(&challenge(json!({"challenge": CRA_CHALLENGE, "salt": ""})))
            .await
            .unwrap();
        assert_eq!(authenticate.signature, "6JdymDadvf7Lk4IPP8+clJpqYDE5Dr5Y72vggrhVFao=");
    }

    #[tokio::test]
    async fn test_authenticate_missing_fields() {
        let auth = WampCraAuthenticator::new("authid", "secret", None);

        let err = auth
            .authenticate(&challenge(json!({"salt": "somesalt", "iterations": 1000, "keylen": 32})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Challenge string missing in extra");

        let err = auth
            .authenticate(&challenge(json!({"challenge": CRA_CHALLENGE, "salt": "somesalt", "keylen": 32})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Iterations missing in extra");

        let err = auth
            .authenticate(&challenge(json!({"challenge": CRA_CHALLENGE, "salt": "somesalt", "iterations": 1000})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Key length missing in extra");

        let err = auth
            .authenticate(&challenge(json!({
                "challenge": CRA_CHALLENGE,
                "salt": "somesalt",
                "iterations": "1000",
                "keylen": 32
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IterationsMissing));

        let err = auth
            .authenticate(&challenge(json!({"challenge": CRA_CHALLENGE, "salt": 5})))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidChallenge(_)));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_oversized_derivation() {
        let auth = WampCraAuthenticator::new("authid", "secret", None);

        for (iterations, keylen) in [
            (json!(1), json!(9_223_372_036_854_775_808u64)),
            (json!(1), json!(MAX_KEY_LENGTH + 1)),
            (json!(MAX_ITERATIONS + 1), json!(32)),
            (json!(u64::MAX), json!(32)),
            (json!(1), json!(1e300)),
        ] {
            let err = auth
                .authenticate(&challenge(json!({
                    "challenge": CRA_CHALLENGE,
                    "salt": "salt123",
                    "iterations": iterations,
                    "keylen": keylen
                })))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidChallenge(_)), "{iterations} {keylen}");
        }
    }

    #[tokio::test]
    async fn test_authenticate_numeric_parameters() {
        let auth = WampCraAuthenticator::new("authid", "secret", None);

        let authenticate = auth
            .authenticate(&challenge(json!({
                "challenge": CRA_CHALLENGE,
                "salt": "salt123",
                "iterations": 100.0,
                "keylen": 16.0
            })))
            .await
            .unwrap();
        assert_eq!(authenticate.signature, "ECYA7DCKDhULQxdkRpvarrynyEM8yhxx6FgXiGc0ZfU=");

        for (iterations, keylen) in [(json!(100.5), json!(16)), (json!(100), json!(-16))] {
            let err = auth
                .authenticate(&challenge(json!({
                    "challenge": CRA_CHALLENGE,
                    "salt": "salt123",
                    "iterations": iterations,
                    "keylen": keylen
                })))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidChallenge(_)), "{iterations} {keylen}");
            assert!(!err.to_string().contains("missing"));
        }
    }

    #[test]
    fn test_generate_challenge_fields() {
        let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(7);
        let generated = generate_wampcra_challenge_with_rng(&mut rng, 12345, "authid", "authrole", "provider");
        let parsed: Value = serde_json::from_str(&generated).unwrap();

        assert_eq!(parsed["session"], json!(12345));
        assert_eq!(parsed["authid"], json!("authid"));
        assert_eq!(parsed["authrole"], json!("authrole"));
        assert_eq!(parsed["authprovider"], json!("provider"));
        assert_eq!(parsed["authmethod"], json!("wampcra"));
        assert_eq!(parsed["nonce"].as_str().unwrap().len(), NONCE_SIZE * 2);

        let timestamp = parsed["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(timestamp.ends_with('Z'));

        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(
            keys,
            ["nonce", "authprovider", "authid", "authrole", "authmethod", "session", "timestamp"]
        );
    }

    #[test]
    fn test_generate_challenge_nonce_varies() {
        let a: Value = serde_json::from_str(&generate_wampcra_challenge(1, "a", "r", "p")).unwrap();
        let b: Value = serde_json::from_str(&generate_wampcra_challenge(1, "a", "r", "p")).unwrap();
        assert_ne!(a["nonce"], b["nonce"]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let auth = WampCraAuthenticator::new("authid", "topsecret", None);
        assert!(!format!("{auth:?}").contains("topsecret"));
    }
}
