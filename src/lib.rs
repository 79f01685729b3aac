//! Client side of a two-party payment channel.
//!
//! Transfers between two parties are proposed and netted into one
//! [channel::ChannelState], which both parties sign. The recipient then
//! submits the state together with both signatures to a settlement contract.
//! [ChannelController] drives a session through these steps and refuses
//! calls made out of order.

mod abipacked {
    mod error;
    mod hashing;
    mod ser;

    pub mod types;

    pub use error::Error;
    pub use hashing::to_hash;
    pub use ser::{to_writer, Writer};

    #[cfg(test)]
    mod tests;
}

pub mod channel;
pub mod config;
pub mod sig;

pub use abipacked::types::{Address, Hash, ParseHexError, Signature, U256};
pub use abipacked::Error as EncodingError;
pub use channel::ChannelController;
pub use config::ChannelConfig;
