use thiserror::Error;

use super::{controller::Phase, settlement::RejectReason, state::Commitment, Direction, Role};
use crate::{abipacked, abipacked::types::Address, sig::ProviderError};

/// Why a [ChannelState][super::ChannelState] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidStateReason {
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("sender and recipient are both {0}")]
    SameParty(Address),
    #[error("parties have not been set")]
    PartiesNotSet,
    #[error("sequence {0} is the last one, start a new session")]
    SequenceExhausted(u64),
}

/// Everything that can go wrong while driving a channel round.
///
/// All variants except [ChannelError::InvariantViolation] leave the
/// controller in the phase it was in before the failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("invalid channel state: {0}")]
    InvalidState(InvalidStateReason),

    #[error("net transfer is zero, nothing to finalize")]
    NothingToFinalize,

    #[error("pending {0:?} total would overflow uint256")]
    AmountOverflow(Direction),

    #[error("expected signer {expected}, provider offers {active:?}")]
    SignerMismatch {
        expected: Address,
        active: Vec<Address>,
    },

    #[error("{role:?} signature does not recover to {expected} (recovered {recovered:?})")]
    InvalidSignature {
        role: Role,
        expected: Address,
        recovered: Option<Address>,
    },

    #[error("signature was made over {actual}, current commitment is {expected}")]
    StaleCommitment {
        expected: Commitment,
        actual: Commitment,
    },

    #[error("both signatures are already present")]
    AlreadyComplete,

    #[error("{missing:?} signature is missing")]
    IncompleteSignatures { missing: Role },

    #[error("only the recipient {expected} may submit, provider offers {active:?}")]
    UnauthorizedSubmitter {
        expected: Address,
        active: Vec<Address>,
    },

    #[error("settlement rejected: {0}")]
    SettlementRejected(RejectReason),

    #[error("could not reach settlement authority: {0}")]
    ConnectivityError(String),

    #[error("operation requires phase {required:?}, channel is {actual:?}")]
    InvalidStateTransition {
        required: &'static [Phase],
        actual: Phase,
    },

    #[error("signing declined: {0}")]
    SigningDeclined(String),

    #[error("signing provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("{0:?} signature request was cancelled")]
    Cancelled(Role),

    /// Unrecoverable: the round is aborted and a new session has to be
    /// started.
    #[error("channel invariant violated: {0}")]
    InvariantViolation(String),

    #[error("could not encode channel state: {0}")]
    Encoding(#[from] abipacked::Error),
}

impl From<ProviderError> for ChannelError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::SigningDeclined(reason) => Self::SigningDeclined(reason),
            ProviderError::ProviderUnavailable(reason) => Self::ProviderUnavailable(reason),
        }
    }
}

impl From<InvalidStateReason> for ChannelError {
    fn from(e: InvalidStateReason) -> Self {
        Self::InvalidState(e)
    }
}
