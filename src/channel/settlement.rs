use async_trait::async_trait;
use core::fmt::{Debug, Display};
use tracing::{info, warn};

use super::{ChannelError, ChannelState, Role, SignatureSet};
use crate::{
    abipacked::types::{Address, Signature, U256},
    config::ChannelConfig,
};

/// Reason codes a settlement authority reports back when it refuses a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    InvalidSignature,
    StaleSequence,
    InsufficientValue,
    Other(String),
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RejectReason::InvalidSignature => f.write_str("invalid signature"),
            RejectReason::StaleSequence => f.write_str("stale sequence"),
            RejectReason::InsufficientValue => f.write_str("insufficient value"),
            RejectReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// Failure of a single submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementFailure {
    /// The authority processed and refused the request.
    Rejected(RejectReason),
    /// The request did not reach the authority, or no answer came back.
    Unreachable(String),
}

impl From<SettlementFailure> for ChannelError {
    fn from(e: SettlementFailure) -> Self {
        match e {
            SettlementFailure::Rejected(reason) => ChannelError::SettlementRejected(reason),
            SettlementFailure::Unreachable(detail) => ChannelError::ConnectivityError(detail),
        }
    }
}

/// `updateBalances(from, to, amount, sequence, sigFrom, sigTo)` plus the
/// transaction envelope it is sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRequest {
    pub contract: Address,
    pub state: ChannelState,
    pub from_signature: Signature,
    pub to_signature: Signature,
    /// Always the recipient of the state.
    pub sender: Address,
    pub value: U256,
    pub gas_limit: u64,
}

/// The system of record, for example a deployed payment channel contract.
///
/// It recomputes the commitment itself, verifies both signatures against
/// `from`/`to` and only then moves balances. The client does not deduplicate
/// submissions, that is the authority's job.
#[async_trait]
pub trait SettlementAuthority: Debug + Send + Sync {
    /// Opaque proof of settlement, e.g. a transaction receipt.
    type Receipt: Debug + Clone + Send;

    async fn update_balances(
        &self,
        request: &SettlementRequest,
    ) -> Result<Self::Receipt, SettlementFailure>;
}

/// Builds and sends the settlement request for a fully signed state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SettlementSubmitter {
    contract: Address,
    gas_limit: u64,
    attach_value: bool,
}

impl SettlementSubmitter {
    pub fn new(config: &ChannelConfig) -> Self {
        SettlementSubmitter {
            contract: config.settlement_contract,
            gas_limit: config.gas_limit,
            attach_value: config.attach_value,
        }
    }

    /// Checks done locally before anything is sent.
    pub fn prepare(
        &self,
        state: &ChannelState,
        signatures: &SignatureSet,
        submitter: Address,
    ) -> Result<SettlementRequest, ChannelError> {
        let (from_signature, to_signature) = match (signatures.payer, signatures.payee) {
            (Some(from), Some(to)) => (from, to),
            (None, _) => {
                return Err(ChannelError::IncompleteSignatures {
                    missing: Role::Payer,
                })
            }
            (_, None) => {
                return Err(ChannelError::IncompleteSignatures {
                    missing: Role::Payee,
                })
            }
        };
        // The payee is the one who wants the state on-chain.
        if submitter != state.to() {
            return Err(ChannelError::UnauthorizedSubmitter {
                expected: state.to(),
                active: vec![submitter],
            });
        }

        Ok(SettlementRequest {
            contract: self.contract,
            state: *state,
            from_signature,
            to_signature,
            sender: submitter,
            value: if self.attach_value {
                state.amount()
            } else {
                U256::zero()
            },
            gas_limit: self.gas_limit,
        })
    }

    /// Single attempt, no retries. A failed attempt can be repeated by the
    /// caller.
    pub async fn submit<S>(
        &self,
        authority: &S,
        state: &ChannelState,
        signatures: &SignatureSet,
        submitter: Address,
    ) -> Result<S::Receipt, ChannelError>
    where
        S: SettlementAuthority + ?Sized,
    {
        let request = self.prepare(state, signatures, submitter)?;
        match authority.update_balances(&request).await {
            Ok(receipt) => {
                info!(sequence = state.sequence(), ?receipt, "state settled");
                Ok(receipt)
            }
            Err(e) => {
                warn!(sequence = state.sequence(), failure = ?e, "settlement failed");
                Err(e.into())
            }
        }
    }
}
