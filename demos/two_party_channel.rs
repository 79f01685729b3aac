//! Walkthrough of one channel round between Alice and Bob, with an in-process
//! wallet and a stand-in for the settlement contract.
//!
//! Run with `RUST_LOG=debug` to see the controller's log output.

use async_trait::async_trait;
use paychan::{
    channel::{
        Direction, RejectReason, Role, SettlementAuthority, SettlementFailure, SettlementRequest,
    },
    sig::{self, LocalKeystore, Signer},
    ChannelConfig, ChannelController,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Helper macro to print significant places in the protocol.
macro_rules! print_bold {
    ($($arg:tt)*) => {
        print!("\x1b[1m");
        print!($($arg)*);
        println!("\x1b[0m");
    };
}

/// Accepts every correctly signed state once, like the deployed contract.
#[derive(Debug, Default)]
struct Contract {
    settled: Mutex<Vec<u64>>,
}

#[async_trait]
impl SettlementAuthority for Contract {
    type Receipt = usize;

    async fn update_balances(
        &self,
        request: &SettlementRequest,
    ) -> Result<usize, SettlementFailure> {
        let state = request.state;
        let commitment = state
            .commitment()
            .map_err(|e| SettlementFailure::Rejected(RejectReason::Other(e.to_string())))?;
        let from = sig::recover_signer(commitment.hash(), request.from_signature);
        let to = sig::recover_signer(commitment.hash(), request.to_signature);
        if from != Ok(state.from()) || to != Ok(state.to()) {
            return Err(SettlementFailure::Rejected(RejectReason::InvalidSignature));
        }

        let mut settled = self.settled.lock().unwrap();
        if settled.contains(&state.sequence()) {
            return Err(SettlementFailure::Rejected(RejectReason::StaleSequence));
        }
        settled.push(state.sequence());
        println!(
            "Contract: {} wei from {} to {} (sequence {})",
            state.amount(),
            state.from().to_checksum(),
            state.to().to_checksum(),
            state.sequence()
        );
        Ok(settled.len())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Do not use that on any real device, this is just for testing.
    let alice = Signer::new(&mut StdRng::seed_from_u64(1));
    let bob = Signer::new(&mut StdRng::seed_from_u64(2));
    let (a, b) = (alice.address(), bob.address());

    let wallet = LocalKeystore::new(vec![alice, bob]);
    let channel = ChannelController::new(&ChannelConfig::default(), wallet, Contract::default());

    print_bold!("Alice: {}, Bob: {}", a.to_checksum(), b.to_checksum());
    channel.set_parties(a, b).await.unwrap();

    channel
        .propose_transfer(Direction::AToB, 5.into())
        .await
        .unwrap();
    channel
        .propose_transfer(Direction::BToA, 2.into())
        .await
        .unwrap();
    println!("Net: {:?}", channel.net_delta().await);

    let round = channel.finalize().await.unwrap();
    print_bold!("Frozen {:?}, commitment {}", round.state, round.commitment);

    // Alice's account is active in the wallet, she pays.
    channel.sign(Role::Payer).await.unwrap();
    println!("Phase after Alice signed: {:?}", channel.status().await.phase);

    // Bob switches accounts, signs and submits.
    channel.provider().activate(b).await.unwrap();
    channel.sign(Role::Payee).await.unwrap();
    let receipt = channel.submit().await.unwrap();
    print_bold!("Settled, receipt {}", receipt);

    // A second submission of the same round is refused locally.
    println!("Second submit: {}", channel.submit().await.unwrap_err());

    let next = channel.next_round().await.unwrap();
    println!("{:#?}", channel.status().await);
    print_bold!("Ready for round {}", next);
}
