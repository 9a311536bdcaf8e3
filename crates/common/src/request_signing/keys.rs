//! RSA key pair generation and PEM encoding.
//!
//! Private keys are stored as PKCS#1 (`RSA PRIVATE KEY`) and public keys are
//! published as PKIX/SPKI (`PUBLIC KEY`), the encodings remote servers expect
//! in an actor's `publicKeyPem`.

use error_stack::{Report, ResultExt};
use rand::rngs::OsRng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, LineEnding};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::constants::RSA_KEY_BITS;
use crate::error::LitePubError;

/// An RSA signing key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the operating system RNG.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Key`] if key generation fails.
    pub fn generate() -> Result<Self, Report<LitePubError>> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).change_context(
            LitePubError::Key {
                message: "Failed to generate RSA key".into(),
            },
        )?;

        Ok(Self::from_private_key(private_key))
    }

    /// Generate a key pair reproducibly from a 4-byte seed.
    ///
    /// The seed is read as a big-endian `u32` and fed to a ChaCha20 generator,
    /// so the same seed always yields the same key. Meant for fixtures and
    /// debugging only: four bytes of entropy is trivially brute-forced.
    ///
    /// # Errors
    ///
    /// Returns [`LitePubError::Key`] if key generation fails.
    pub fn generate_deterministic(seed: [u8; 4]) -> Result<Self, Report<LitePubError>> {
        let seed = u32::from_be_bytes(seed);
        let mut rng = ChaCha20Rng::seed_from_u64(u64::from(seed));

        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS).change_context(
            LitePubError::Key {
                message: format!("Failed to generate RSA key from seed {:#010x}", seed),
            },
        )?;

        Ok(Self::from_private_key(private_key))
    }

    #[must_use]
    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// # Errors
    ///
    /// Returns [`LitePubError::Key`] if the text is not a PKCS#1 private key.
    pub fn from_private_key_pem(pem: &str) -> Result<Self, Report<LitePubError>> {
        decode_private_key_pem(pem).map(Self::from_private_key)
    }

    /// # Errors
    ///
    /// Returns [`LitePubError::Key`] if encoding fails.
    pub fn private_key_pem(&self) -> Result<String, Report<LitePubError>> {
        encode_private_key_pem(&self.private_key)
    }

    /// # Errors
    ///
    /// Returns [`LitePubError::Key`] if encoding fails.
    pub fn public_key_pem(&self) -> Result<String, Report<LitePubError>> {
        encode_public_key_pem(&self.public_key)
    }
}

/// Encode a public key as a PKIX `PUBLIC KEY` PEM block.
///
/// # Errors
///
/// Returns [`LitePubError::Key`] if DER encoding fails.
pub fn encode_public_key_pem(public_key: &RsaPublicKey) -> Result<String, Report<LitePubError>> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .change_context(LitePubError::Key {
            message: "Failed to encode public key".into(),
        })
}

/// Decode a public key from PEM.
///
/// PKIX `PUBLIC KEY` is the format actors publish; PKCS#1 `RSA PUBLIC KEY` is
/// accepted as well since some older servers emit it.
///
/// # Errors
///
/// Returns [`LitePubError::Key`] if the text is neither encoding.
pub fn decode_public_key_pem(pem: &str) -> Result<RsaPublicKey, Report<LitePubError>> {
    let pem = pem.trim();
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .change_context(LitePubError::Key {
            message: "Failed to decode PEM public key".into(),
        })
}

/// Encode a private key as a PKCS#1 `RSA PRIVATE KEY` PEM block.
///
/// # Errors
///
/// Returns [`LitePubError::Key`] if DER encoding fails.
pub fn encode_private_key_pem(
    private_key: &RsaPrivateKey,
) -> Result<String, Report<LitePubError>> {
    let pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .change_context(LitePubError::Key {
            message: "Failed to encode private key".into(),
        })?;

    Ok(pem.to_string())
}

/// Decode a PKCS#1 private key from PEM.
///
/// # Errors
///
/// Returns [`LitePubError::Key`] if the delimiters or DER structure are invalid.
pub fn decode_private_key_pem(pem: &str) -> Result<RsaPrivateKey, Report<LitePubError>> {
    RsaPrivateKey::from_pkcs1_pem(pem.trim()).change_context(LitePubError::Key {
        message: "Failed to decode PEM private key".into(),
    })
}
