use async_trait::async_trait;
use core::fmt::Debug;
use thiserror::Error;

use crate::abipacked::types::{Address, Hash, Signature};

/// Failure reported by a [SigningProvider].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The key holder (usually a human) refused to sign.
    #[error("signing declined: {0}")]
    SigningDeclined(String),
    /// The provider could not be reached at all.
    #[error("signing provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Whoever holds the private keys: a wallet, a hardware device or a
/// [LocalKeystore][super::LocalKeystore].
///
/// Both calls may suspend for an arbitrary amount of time, a human may have to
/// confirm the request first.
#[async_trait]
pub trait SigningProvider: Debug + Send + Sync {
    /// The identities the provider would currently sign with. Wallets usually
    /// report exactly one active account.
    async fn active_identities(&self) -> Result<Vec<Address>, ProviderError>;

    /// Produce an Ethereum personal-message signature over `message` with the
    /// key of `identity`.
    async fn sign(&self, identity: Address, message: Hash) -> Result<Signature, ProviderError>;
}
