use super::{ChannelError, Direction};
use crate::abipacked::types::U256;

/// Running totals of the transfers proposed in each direction during a
/// session.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TransferAccumulator {
    to_b: U256,
    to_a: U256,
}

/// Result of netting both directions against each other.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NetDelta {
    /// Both totals are equal, there is nothing to settle.
    Balanced,
    Owed { direction: Direction, amount: U256 },
}

impl NetDelta {
    pub fn amount(&self) -> U256 {
        match self {
            NetDelta::Balanced => U256::zero(),
            NetDelta::Owed { amount, .. } => *amount,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            NetDelta::Balanced => None,
            NetDelta::Owed { direction, .. } => Some(*direction),
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, NetDelta::Balanced)
    }
}

impl TransferAccumulator {
    /// Add `amount` to the total of `direction`. On overflow nothing changes.
    pub fn propose(&mut self, direction: Direction, amount: U256) -> Result<(), ChannelError> {
        let total = self.total_mut(direction);
        *total = total
            .checked_add(amount)
            .ok_or(ChannelError::AmountOverflow(direction))?;
        Ok(())
    }

    pub fn total(&self, direction: Direction) -> U256 {
        match direction {
            Direction::AToB => self.to_b,
            Direction::BToA => self.to_a,
        }
    }

    fn total_mut(&mut self, direction: Direction) -> &mut U256 {
        match direction {
            Direction::AToB => &mut self.to_b,
            Direction::BToA => &mut self.to_a,
        }
    }

    /// Pure: calling it any number of times does not change the totals.
    pub fn net_delta(&self) -> NetDelta {
        use core::cmp::Ordering;

        match self.to_b.cmp(&self.to_a) {
            Ordering::Equal => NetDelta::Balanced,
            Ordering::Greater => NetDelta::Owed {
                direction: Direction::AToB,
                amount: self.to_b - self.to_a,
            },
            Ordering::Less => NetDelta::Owed {
                direction: Direction::BToA,
                amount: self.to_a - self.to_b,
            },
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
