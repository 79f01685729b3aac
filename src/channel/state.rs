use core::fmt::Display;

use serde::Serialize;

use super::{ChannelError, InvalidStateReason, Role};
use crate::abipacked::{
    self,
    types::{Address, Hash, U256},
};

/// The state both parties sign and the settlement contract checks: `amount`
/// moves from `from` to `to` in round `sequence`.
///
/// Fields are private so that only [ChannelState::freeze] can produce one,
/// which keeps `amount > 0` and `from != to` true for every instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelState {
    from: Address,
    to: Address,
    amount: U256,
    sequence: u64,
}

/// The on-chain view: `(address, address, uint256, uint256)` in this order.
/// The contract recomputes exactly this, so neither order nor widths may
/// change.
#[derive(Serialize)]
struct PackedState {
    from: Address,
    to: Address,
    amount: U256,
    sequence: U256,
}

impl ChannelState {
    pub fn freeze(
        from: Address,
        to: Address,
        amount: U256,
        sequence: u64,
    ) -> Result<Self, ChannelError> {
        if amount.is_zero() {
            return Err(InvalidStateReason::ZeroAmount.into());
        }
        if from == to {
            return Err(InvalidStateReason::SameParty(from).into());
        }
        Ok(ChannelState {
            from,
            to,
            amount,
            sequence,
        })
    }

    pub fn from(&self) -> Address {
        self.from
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Address expected to sign in `role`.
    pub fn signer(&self, role: Role) -> Address {
        match role {
            Role::Payer => self.from,
            Role::Payee => self.to,
        }
    }

    /// `keccak256(abi.encodePacked(from, to, amount, sequence))`.
    pub fn commitment(&self) -> Result<Commitment, abipacked::Error> {
        abipacked::to_hash(&PackedState {
            from: self.from,
            to: self.to,
            amount: self.amount,
            sequence: U256::from(self.sequence),
        })
        .map(Commitment)
    }
}

/// Hash of a frozen [ChannelState], the message both parties sign.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Commitment(Hash);

impl Commitment {
    pub fn hash(&self) -> Hash {
        self.0
    }
}

impl Display for Commitment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A state together with its commitment, as held between `finalize()` and
/// `submit()`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrozenRound {
    pub state: ChannelState,
    pub commitment: Commitment,
}

impl FrozenRound {
    pub fn new(state: ChannelState) -> Result<Self, ChannelError> {
        let commitment = state.commitment()?;
        Ok(FrozenRound { state, commitment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn a() -> Address {
        "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5".parse().unwrap()
    }

    fn b() -> Address {
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap()
    }

    #[test]
    fn freeze_validates() {
        assert_eq!(
            ChannelState::freeze(a(), b(), U256::zero(), 0),
            Err(ChannelError::InvalidState(InvalidStateReason::ZeroAmount))
        );
        assert_eq!(
            ChannelState::freeze(a(), a(), 1.into(), 0),
            Err(ChannelError::InvalidState(InvalidStateReason::SameParty(a())))
        );

        let state = ChannelState::freeze(a(), b(), 3.into(), 0).unwrap();
        assert_eq!(state.signer(Role::Payer), a());
        assert_eq!(state.signer(Role::Payee), b());
    }

    #[test]
    fn commitment_matches_solidity_sha3() {
        let state = ChannelState::freeze(a(), b(), 3.into(), 0).unwrap();
        assert_eq!(
            state.commitment().unwrap().to_string(),
            "0x6fc088f99c6e121adc7e946748a050865a0370fb33a2078060905fcc4649c145"
        );

        // The sequence is encoded as uint256, not uint64.
        let next = ChannelState::freeze(a(), b(), 3.into(), 1).unwrap();
        assert_eq!(
            next.commitment().unwrap().to_string(),
            "0x6c7bd9f8e033cd66025f1d333eb3b3ce5ddc8ac1ceff07dcfff1f4d7c9641f52"
        );
    }

    #[test]
    fn swapping_parties_changes_commitment() {
        let forward = ChannelState::freeze(a(), b(), 3.into(), 0).unwrap();
        let backward = ChannelState::freeze(b(), a(), 3.into(), 0).unwrap();
        assert_ne!(
            forward.commitment().unwrap(),
            backward.commitment().unwrap()
        );
    }

    #[test]
    fn random_fixtures_are_deterministic_and_field_sensitive() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let from: Address = rng.gen();
            let to: Address = rng.gen();
            let amount = U256::from(rng.gen_range(1..u64::MAX));
            let sequence: u64 = rng.gen();

            let state = ChannelState::freeze(from, to, amount, sequence).unwrap();
            let c = state.commitment().unwrap();
            assert_eq!(c, state.commitment().unwrap());

            let mutated = [
                ChannelState::freeze(rng.gen(), to, amount, sequence),
                ChannelState::freeze(from, rng.gen(), amount, sequence),
                ChannelState::freeze(from, to, amount + 1, sequence),
                ChannelState::freeze(from, to, amount, sequence.wrapping_add(1)),
            ];
            for m in mutated {
                assert_ne!(m.unwrap().commitment().unwrap(), c);
            }
        }
    }

    fn address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address)
    }

    proptest! {
        #[test]
        fn single_field_change_changes_commitment(
            from in address(),
            to in address(),
            amount in 1..u128::MAX,
            sequence in any::<u64>(),
            delta in 1..1000u64,
        ) {
            prop_assume!(from != to);
            let state = ChannelState::freeze(from, to, U256::from(amount), sequence).unwrap();
            let c = state.commitment().unwrap();

            let bumped = ChannelState::freeze(from, to, U256::from(amount) + delta, sequence).unwrap();
            prop_assert_ne!(bumped.commitment().unwrap(), c);

            let later = ChannelState::freeze(from, to, U256::from(amount), sequence.wrapping_add(delta)).unwrap();
            prop_assert_ne!(later.commitment().unwrap(), c);

            let swapped = ChannelState::freeze(to, from, U256::from(amount), sequence).unwrap();
            prop_assert_ne!(swapped.commitment().unwrap(), c);
        }
    }
}
