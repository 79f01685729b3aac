use tracing::debug;

use super::{ChannelError, Commitment, Role};
use crate::{
    abipacked::types::{Address, Signature},
    sig::{self, SigningProvider},
};

/// The payer and payee signatures over one commitment.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet {
    pub payer: Option<Signature>,
    pub payee: Option<Signature>,
}

impl SignatureSet {
    pub fn get(&self, role: Role) -> Option<Signature> {
        match role {
            Role::Payer => self.payer,
            Role::Payee => self.payee,
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<Signature> {
        match role {
            Role::Payer => &mut self.payer,
            Role::Payee => &mut self.payee,
        }
    }

    /// First role without a signature, payer before payee.
    pub fn missing(&self) -> Option<Role> {
        Role::ALL.into_iter().find(|&role| self.get(role).is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_none()
    }

    pub fn count(&self) -> usize {
        Role::ALL
            .into_iter()
            .filter(|&role| self.get(role).is_some())
            .count()
    }
}

/// Holds the signatures of the current round and the commitment they were
/// made over. Binding to a different commitment drops them.
#[derive(Debug, Clone, Default)]
pub struct SignatureCollector {
    commitment: Option<Commitment>,
    signatures: SignatureSet,
}

/// Check that `signature` over `commitment` was made by `expected`.
pub(super) fn verify(
    role: Role,
    commitment: Commitment,
    signature: Signature,
    expected: Address,
) -> Result<(), ChannelError> {
    match sig::recover_signer(commitment.hash(), signature) {
        Ok(recovered) if recovered == expected => Ok(()),
        Ok(recovered) => Err(ChannelError::InvalidSignature {
            role,
            expected,
            recovered: Some(recovered),
        }),
        Err(_) => Err(ChannelError::InvalidSignature {
            role,
            expected,
            recovered: None,
        }),
    }
}

impl SignatureCollector {
    /// Bind to `commitment`. Returns whether signatures over a previous
    /// commitment were discarded.
    pub fn bind(&mut self, commitment: Commitment) -> bool {
        if self.commitment == Some(commitment) {
            return false;
        }
        let discarded = self.signatures.count() > 0;
        self.commitment = Some(commitment);
        self.signatures = SignatureSet::default();
        discarded
    }

    pub fn commitment(&self) -> Option<Commitment> {
        self.commitment
    }

    /// Ask `provider` to sign `commitment` as `signer`.
    ///
    /// The provider's active identities are checked against `expected` before
    /// the signing request is sent, so a wrong account never sees it. The
    /// returned signature is verified to recover to `expected`.
    pub async fn request_signature<P>(
        provider: &P,
        role: Role,
        commitment: Commitment,
        signer: Address,
        expected: Address,
    ) -> Result<Signature, ChannelError>
    where
        P: SigningProvider + ?Sized,
    {
        if signer != expected {
            return Err(ChannelError::SignerMismatch {
                expected,
                active: vec![signer],
            });
        }
        let active = provider.active_identities().await?;
        if !active.contains(&expected) {
            return Err(ChannelError::SignerMismatch { expected, active });
        }

        debug!(?role, %signer, %commitment, "requesting signature");
        let signature = provider.sign(signer, commitment.hash()).await?;
        verify(role, commitment, signature, expected)?;
        Ok(signature)
    }

    /// Store `signature` for `role`. Overwrites a previous one for the same
    /// role.
    pub fn record_signature(
        &mut self,
        role: Role,
        commitment: Commitment,
        signature: Signature,
        expected: Address,
    ) -> Result<(), ChannelError> {
        match self.commitment {
            Some(current) if current == commitment => {}
            Some(current) => {
                return Err(ChannelError::StaleCommitment {
                    expected: current,
                    actual: commitment,
                })
            }
            None => {
                return Err(ChannelError::InvariantViolation(
                    "signature recorded before any commitment was bound".into(),
                ))
            }
        }
        verify(role, commitment, signature, expected)?;
        *self.signatures.slot(role) = Some(signature);
        Ok(())
    }

    /// Both signatures present for the bound commitment.
    pub fn is_complete(&self) -> bool {
        self.commitment.is_some() && self.signatures.is_complete()
    }

    pub fn missing(&self) -> Option<Role> {
        self.signatures.missing()
    }

    pub fn signatures(&self) -> SignatureSet {
        self.signatures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abipacked::types::U256,
        channel::ChannelState,
        sig::{LocalKeystore, Signer},
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn signers() -> (Signer, Signer) {
        (
            Signer::new(&mut StdRng::seed_from_u64(1)),
            Signer::new(&mut StdRng::seed_from_u64(2)),
        )
    }

    fn commitment(from: Address, to: Address, amount: u64) -> Commitment {
        ChannelState::freeze(from, to, U256::from(amount), 0)
            .unwrap()
            .commitment()
            .unwrap()
    }

    #[test]
    fn records_and_completes() {
        let (alice, bob) = signers();
        let c = commitment(alice.address(), bob.address(), 3);
        let mut collector = SignatureCollector::default();
        assert!(!collector.bind(c));

        let sig_a = alice.sign_eth(c.hash()).unwrap();
        collector
            .record_signature(Role::Payer, c, sig_a, alice.address())
            .unwrap();
        assert_eq!(collector.missing(), Some(Role::Payee));
        assert!(!collector.is_complete());

        let sig_b = bob.sign_eth(c.hash()).unwrap();
        collector
            .record_signature(Role::Payee, c, sig_b, bob.address())
            .unwrap();
        assert!(collector.is_complete());
        assert_eq!(
            collector.signatures(),
            SignatureSet {
                payer: Some(sig_a),
                payee: Some(sig_b)
            }
        );
    }

    #[test]
    fn rejects_signature_from_wrong_party() {
        let (alice, bob) = signers();
        let c = commitment(alice.address(), bob.address(), 3);
        let mut collector = SignatureCollector::default();
        collector.bind(c);

        let sig_b = bob.sign_eth(c.hash()).unwrap();
        assert_eq!(
            collector.record_signature(Role::Payer, c, sig_b, alice.address()),
            Err(ChannelError::InvalidSignature {
                role: Role::Payer,
                expected: alice.address(),
                recovered: Some(bob.address()),
            })
        );
        assert_eq!(collector.signatures(), SignatureSet::default());
    }

    #[test]
    fn rebinding_discards_signatures() {
        let (alice, bob) = signers();
        let c1 = commitment(alice.address(), bob.address(), 3);
        let c2 = commitment(alice.address(), bob.address(), 4);
        let mut collector = SignatureCollector::default();
        collector.bind(c1);
        collector
            .record_signature(
                Role::Payer,
                c1,
                alice.sign_eth(c1.hash()).unwrap(),
                alice.address(),
            )
            .unwrap();

        // Same commitment again keeps them.
        assert!(!collector.bind(c1));
        assert_eq!(collector.signatures().count(), 1);

        assert!(collector.bind(c2));
        assert_eq!(collector.signatures().count(), 0);
        assert_eq!(collector.commitment(), Some(c2));

        // A late signature over c1 is stale now.
        assert_eq!(
            collector.record_signature(
                Role::Payee,
                c1,
                bob.sign_eth(c1.hash()).unwrap(),
                bob.address()
            ),
            Err(ChannelError::StaleCommitment {
                expected: c2,
                actual: c1
            })
        );
    }

    #[tokio::test]
    async fn request_checks_active_identity_first() {
        let (alice, bob) = signers();
        let (a, b) = (alice.address(), bob.address());
        let c = commitment(a, b, 3);
        let keystore = LocalKeystore::new(vec![alice, bob]);

        assert_eq!(
            SignatureCollector::request_signature(&keystore, Role::Payee, c, b, b).await,
            Err(ChannelError::SignerMismatch {
                expected: b,
                active: vec![a],
            })
        );

        let sig = SignatureCollector::request_signature(&keystore, Role::Payer, c, a, a)
            .await
            .unwrap();
        assert_eq!(sig::recover_signer(c.hash(), sig).unwrap(), a);

        assert_eq!(
            SignatureCollector::request_signature(&keystore, Role::Payer, c, b, a).await,
            Err(ChannelError::SignerMismatch {
                expected: a,
                active: vec![b],
            })
        );
    }
}
