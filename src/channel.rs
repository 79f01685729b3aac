//! Two-party payment channel: transfers are proposed, netted into a single
//! [ChannelState], signed by both parties and submitted once for settlement.

mod accumulator;
mod controller;
mod error;
mod settlement;
mod signatures;
mod state;


use crate::abipacked::types::Address;

pub use accumulator::{NetDelta, TransferAccumulator};
pub use controller::{ChannelController, ChannelStatus, Phase};
pub use error::{ChannelError, InvalidStateReason};
pub use settlement::{
    RejectReason, SettlementAuthority, SettlementFailure, SettlementRequest, SettlementSubmitter,
};
pub use signatures::{SignatureCollector, SignatureSet};
pub use state::{ChannelState, Commitment, FrozenRound};

/// Direction of a proposed transfer between the two registered parties.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    AToB,
    BToA,
}

/// Who signs what in a round. The payer is the `from` of the frozen state,
/// the payee its `to`; which party that is depends on the netted direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Payer,
    Payee,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Payer, Role::Payee];
}

/// The two participants of a channel session, as given by the operator.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Parties {
    a: Address,
    b: Address,
}

impl Parties {
    pub fn new(a: Address, b: Address) -> Result<Self, ChannelError> {
        if a == b {
            return Err(ChannelError::InvalidState(InvalidStateReason::SameParty(a)));
        }
        Ok(Parties { a, b })
    }

    pub fn a(&self) -> Address {
        self.a
    }

    pub fn b(&self) -> Address {
        self.b
    }

    /// `(from, to)` of a transfer in `direction`.
    pub fn endpoints(&self, direction: Direction) -> (Address, Address) {
        match direction {
            Direction::AToB => (self.a, self.b),
            Direction::BToA => (self.b, self.a),
        }
    }
}
