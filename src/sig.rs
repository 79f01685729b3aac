//! Handles the creation and verification of (Ethereum) Signatures, and the
//! boundary to whoever holds the private keys.

use crate::abipacked::types::Hash;
use sha3::{Digest, Keccak256};
use thiserror::Error;

#[cfg(not(any(feature = "k256", feature = "secp256k1")))]
compile_error!("enable one of the signature backends: `k256` or `secp256k1`");

#[cfg(feature = "k256")]
mod k256;
#[cfg(all(feature = "k256", not(feature = "secp256k1")))]
pub use self::k256::{recover_signer, Signer};

#[cfg(feature = "secp256k1")]
mod secp256k1;
#[cfg(feature = "secp256k1")]
pub use self::secp256k1::{recover_signer, Signer};

mod keystore;
mod provider;

pub use keystore::LocalKeystore;
pub use provider::{ProviderError, SigningProvider};


/// Errors from the signature backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// `v` must be 27 or 28.
    #[error("invalid recovery byte v={0}")]
    InvalidRecoveryId(u8),
    #[error("invalid private key")]
    InvalidSecretKey,
    #[error("signature backend failure: {0}")]
    Backend(String),
}

/// Add the `\x19Ethereum Signed Message\n<length>` prefix to hash.
///
/// This is what `personal.sign` does to the message before signing, and
/// therefore what the settlement contract undoes before `ecrecover`.
fn hash_to_eth_signed_msg_hash(hash: Hash) -> Hash {
    // Packed encoding of a fixed prefix and 32 bytes, no need for the serializer.
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n32");
    hasher.update(hash.0);
    Hash(hasher.finalize().into())
}

/// Map the Ethereum `v` (27/28) back to the raw recovery id.
fn recovery_id(v: u8) -> Result<u8, Error> {
    match v {
        27 | 28 => Ok(v - 27),
        _ => Err(Error::InvalidRecoveryId(v)),
    }
}
