use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ProviderError, Signer, SigningProvider};
use crate::abipacked::types::{Address, Hash, Signature};

/// In-process [SigningProvider] holding several keys, of which one is active
/// at a time, like accounts in a browser wallet.
#[derive(Debug)]
pub struct LocalKeystore {
    signers: Vec<Signer>,
    active: RwLock<Option<Address>>,
}

impl LocalKeystore {
    /// The first signer (if any) starts out active.
    pub fn new(signers: Vec<Signer>) -> Self {
        let active = signers.first().map(Signer::address);
        LocalKeystore {
            signers,
            active: RwLock::new(active),
        }
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(Signer::address).collect()
    }

    /// Switch the active account.
    pub async fn activate(&self, identity: Address) -> Result<(), ProviderError> {
        if !self.signers.iter().any(|s| s.address() == identity) {
            return Err(ProviderError::SigningDeclined(format!(
                "no key for {} in keystore",
                identity
            )));
        }
        *self.active.write().await = Some(identity);
        debug!(%identity, "activated keystore account");
        Ok(())
    }

    pub async fn active(&self) -> Option<Address> {
        *self.active.read().await
    }
}

#[async_trait]
impl SigningProvider for LocalKeystore {
    async fn active_identities(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.active().await.into_iter().collect())
    }

    async fn sign(&self, identity: Address, message: Hash) -> Result<Signature, ProviderError> {
        if self.active().await != Some(identity) {
            return Err(ProviderError::SigningDeclined(format!(
                "{} is not the active account",
                identity
            )));
        }
        let signer = self
            .signers
            .iter()
            .find(|s| s.address() == identity)
            .ok_or_else(|| {
                ProviderError::SigningDeclined(format!("no key for {} in keystore", identity))
            })?;
        signer
            .sign_eth(message)
            .map_err(|e| ProviderError::ProviderUnavailable(e.to_string()))
    }
}
