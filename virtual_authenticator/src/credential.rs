use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::AuthenticatorError;
use crate::utils::{base64url_bytes, base64url_encode};

const CREDENTIAL_ID_LEN: usize = 32;

/// A P-256 passkey held by the virtual authenticator.
///
/// The signature counter is atomic, so concurrent workers sharing one
/// credential never issue the same value. Their responses can still reach a
/// relying party out of order. The whole credential serializes to JSON,
/// private key included.
#[derive(Serialize, Deserialize)]
pub struct Credential {
    #[serde(with = "base64url_bytes")]
    id: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    private_key: Vec<u8>,
    counter: AtomicU32,
}

impl Credential {
    /// Generates a fresh key pair and a random 32-byte credential ID.
    pub fn new() -> Result<Self, AuthenticatorError> {
        let rng = SystemRandom::new();

        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map_err(|_| AuthenticatorError::Crypto("Failed to generate key pair".into()))?;

        let mut id = vec![0u8; CREDENTIAL_ID_LEN];
        rng.fill(&mut id)
            .map_err(|_| AuthenticatorError::Crypto("Failed to generate credential ID".into()))?;

        Ok(Self {
            id,
            private_key: pkcs8.as_ref().to_vec(),
            counter: AtomicU32::new(0),
        })
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    /// Credential ID as the relying party sees it (base64url, no padding).
    pub fn id_base64(&self) -> String {
        base64url_encode(&self.id)
    }

    /// Current signature counter.
    pub fn counter(&self) -> u32 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Overwrites the signature counter, e.g. to replay an older state.
    pub fn set_counter(&self, value: u32) {
        self.counter.store(value, Ordering::SeqCst);
    }

    /// Increments the counter and returns the new value.
    pub(crate) fn next_counter(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
    }

    fn key_pair(&self) -> Result<EcdsaKeyPair, AuthenticatorError> {
        EcdsaKeyPair::from_pkcs8(
            &ECDSA_P256_SHA256_ASN1_SIGNING,
            &self.private_key,
            &SystemRandom::new(),
        )
        .map_err(|e| AuthenticatorError::Crypto(format!("Invalid private key: {e}")))
    }

    /// Affine coordinates of the public key.
    pub(crate) fn public_key_coords(&self) -> Result<([u8; 32], [u8; 32]), AuthenticatorError> {
        let key_pair = self.key_pair()?;
        let point = key_pair.public_key().as_ref();
        if point.len() != 65 || point[0] != 0x04 {
            return Err(AuthenticatorError::Crypto(
                "Unexpected public key format".into(),
            ));
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&point[1..33]);
        y.copy_from_slice(&point[33..65]);
        Ok((x, y))
    }

    /// ASN.1 DER ECDSA signature over `message`.
    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, AuthenticatorError> {
        let signature = self
            .key_pair()?
            .sign(&SystemRandom::new(), message)
            .map_err(|_| AuthenticatorError::Crypto("Failed to sign".into()))?;
        Ok(signature.as_ref().to_vec())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id_base64())
            .field("counter", &self.counter())
            .finish_non_exhaustive()
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            private_key: self.private_key.clone(),
            counter: AtomicU32::new(self.counter()),
        }
    }
}

/// Creates a new EC2 (P-256) credential.
pub fn create_credential() -> Result<Credential, AuthenticatorError> {
    Credential::new()
}
