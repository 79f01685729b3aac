use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    signatures::verify, ChannelError, ChannelState, Commitment, Direction, FrozenRound,
    InvalidStateReason, NetDelta, Parties, Role, SettlementAuthority, SettlementSubmitter,
    SignatureCollector, SignatureSet, TransferAccumulator,
};
use crate::{
    abipacked::types::{Address, Signature, U256},
    config::ChannelConfig,
    sig::SigningProvider,
};

/// Where the current round stands.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Accumulating,
    Frozen,
    PartiallySigned,
    FullySigned,
    Submitted,
    /// An internal invariant broke. Only a new session leaves this phase.
    Aborted,
}

/// Snapshot returned by [ChannelController::status].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStatus {
    pub phase: Phase,
    pub parties: Option<Parties>,
    pub sequence: u64,
    pub pending_to_b: U256,
    pub pending_to_a: U256,
    pub net: NetDelta,
    pub round: Option<FrozenRound>,
    /// Signatures over `round`'s commitment, empty while nothing is frozen.
    pub signatures: SignatureSet,
}

#[derive(Debug, Default)]
struct Session {
    parties: Option<Parties>,
    sequence: u64,
    phase: Phase,
    transfers: TransferAccumulator,
    round: Option<FrozenRound>,
    signatures: SignatureCollector,
}

impl Session {
    fn new(parties: Option<Parties>, sequence: u64) -> Self {
        Session {
            parties,
            sequence,
            ..Session::default()
        }
    }

    fn require(&self, allowed: &'static [Phase]) -> Result<(), ChannelError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(ChannelError::InvalidStateTransition {
                required: allowed,
                actual: self.phase,
            })
        }
    }

    fn round(&self) -> Result<FrozenRound, ChannelError> {
        self.round.ok_or_else(|| {
            ChannelError::InvariantViolation(format!("phase {:?} without frozen state", self.phase))
        })
    }

    /// Phase implied by the number of signatures over the frozen commitment.
    fn signed_phase(&self) -> Phase {
        match self.signatures.signatures().count() {
            0 => Phase::Frozen,
            1 => Phase::PartiallySigned,
            _ => Phase::FullySigned,
        }
    }

    /// Gate shared by `sign` and `record_signature`.
    fn require_signable(&self) -> Result<FrozenRound, ChannelError> {
        if self.phase == Phase::FullySigned {
            return Err(ChannelError::AlreadyComplete);
        }
        self.require(&[Phase::Frozen, Phase::PartiallySigned])?;
        self.round()
    }

    /// Everything `submit` relies on, re-derived from scratch.
    fn check_integrity(&self, round: &FrozenRound) -> Result<(), ChannelError> {
        let recomputed = round.state.commitment()?;
        if recomputed != round.commitment {
            return Err(ChannelError::InvariantViolation(format!(
                "frozen state hashes to {}, held commitment is {}",
                recomputed, round.commitment
            )));
        }
        if self.signatures.commitment() != Some(round.commitment) {
            return Err(ChannelError::InvariantViolation(format!(
                "signatures are bound to {:?}, frozen commitment is {}",
                self.signatures.commitment(),
                round.commitment
            )));
        }
        let set = self.signatures.signatures();
        for role in Role::ALL {
            let signature = set
                .get(role)
                .ok_or(ChannelError::IncompleteSignatures { missing: role })?;
            verify(role, round.commitment, signature, round.state.signer(role)).map_err(|e| {
                ChannelError::InvariantViolation(format!("held signature no longer valid: {}", e))
            })?;
        }
        Ok(())
    }
}

/// Owns one channel session and drives it through
/// `Idle → Accumulating → Frozen → PartiallySigned → FullySigned → Submitted`.
///
/// All mutation goes through a per-session lock. Calls that wait on the
/// signing provider or the settlement authority hold that lock until they
/// return, so nothing else changes the session meanwhile. Dropping such a
/// future (or cancelling it) leaves the session as it was before the call.
#[derive(Debug)]
pub struct ChannelController<P, S>
where
    P: SigningProvider,
    S: SettlementAuthority,
{
    provider: P,
    authority: S,
    submitter: SettlementSubmitter,
    session: Mutex<Session>,
}

impl<P, S> ChannelController<P, S>
where
    P: SigningProvider,
    S: SettlementAuthority,
{
    pub fn new(config: &ChannelConfig, provider: P, authority: S) -> Self {
        ChannelController {
            provider,
            authority,
            submitter: SettlementSubmitter::new(config),
            session: Mutex::new(Session::default()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn authority(&self) -> &S {
        &self.authority
    }

    async fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }

    /// Whether a call currently holds the session, e.g. a pending signature
    /// request.
    pub fn is_busy(&self) -> bool {
        self.session.try_lock().is_err()
    }

    /// Start a new session between `a` and `b`. Everything from the previous
    /// session is dropped and the sequence starts over at 0.
    pub async fn set_parties(&self, a: Address, b: Address) -> Result<(), ChannelError> {
        let parties = Parties::new(a, b)?;
        let mut session = self.session().await;
        *session = Session::new(Some(parties), 0);
        info!(%a, %b, "new channel session");
        Ok(())
    }

    /// Add a transfer to the running totals. Reopens a frozen, not yet fully
    /// signed round.
    pub async fn propose_transfer(
        &self,
        direction: Direction,
        amount: U256,
    ) -> Result<(), ChannelError> {
        let mut session = self.session().await;
        session.require(&[
            Phase::Idle,
            Phase::Accumulating,
            Phase::Frozen,
            Phase::PartiallySigned,
        ])?;
        session.transfers.propose(direction, amount)?;
        if session.round.take().is_some() {
            debug!("frozen round reopened by new proposal");
        }
        session.phase = Phase::Accumulating;
        debug!(?direction, %amount, "transfer proposed");
        Ok(())
    }

    pub async fn net_delta(&self) -> NetDelta {
        self.session().await.transfers.net_delta()
    }

    /// Net the pending transfers into the state to sign.
    ///
    /// Signatures already collected survive only if the resulting commitment
    /// is the one they were made over.
    pub async fn finalize(&self) -> Result<FrozenRound, ChannelError> {
        let mut session = self.session().await;
        session.require(&[Phase::Accumulating])?;
        let parties = session
            .parties
            .ok_or(ChannelError::InvalidState(InvalidStateReason::PartiesNotSet))?;

        let (direction, amount) = match session.transfers.net_delta() {
            NetDelta::Balanced => return Err(ChannelError::NothingToFinalize),
            NetDelta::Owed { direction, amount } => (direction, amount),
        };
        let (from, to) = parties.endpoints(direction);
        let round = FrozenRound::new(ChannelState::freeze(from, to, amount, session.sequence)?)?;

        if session.signatures.bind(round.commitment) {
            warn!(commitment = %round.commitment, "discarded signatures over previous commitment");
        }
        session.round = Some(round);
        session.phase = session.signed_phase();
        info!(
            sequence = session.sequence,
            %from,
            %to,
            %amount,
            commitment = %round.commitment,
            phase = ?session.phase,
            "channel state frozen"
        );
        Ok(round)
    }

    /// Have the provider sign the frozen commitment for `role`.
    ///
    /// Fails with [ChannelError::SignerMismatch] without contacting the
    /// provider's signing endpoint if the provider's active identity is not
    /// the party expected for `role`.
    pub async fn sign(&self, role: Role) -> Result<Signature, ChannelError> {
        let mut session = self.session().await;
        let round = session.require_signable()?;
        let signer = round.state.signer(role);

        let signature = match SignatureCollector::request_signature(
            &self.provider,
            role,
            round.commitment,
            signer,
            signer,
        )
        .await
        {
            Ok(signature) => signature,
            Err(e) => {
                warn!(?role, %signer, error = %e, "signature request failed");
                return Err(e);
            }
        };

        session
            .signatures
            .record_signature(role, round.commitment, signature, signer)?;
        session.phase = session.signed_phase();
        info!(?role, %signer, phase = ?session.phase, "signature accepted");
        Ok(signature)
    }

    /// Like [ChannelController::sign], but gives up with
    /// [ChannelError::Cancelled] once `cancel` fires.
    pub async fn sign_until_cancelled(
        &self,
        role: Role,
        cancel: &CancellationToken,
    ) -> Result<Signature, ChannelError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(?role, "signature request cancelled");
                Err(ChannelError::Cancelled(role))
            }
            result = self.sign(role) => result,
        }
    }

    /// Accept a signature that was produced elsewhere, e.g. by the other
    /// party's own client.
    pub async fn record_signature(
        &self,
        role: Role,
        commitment: Commitment,
        signature: Signature,
    ) -> Result<(), ChannelError> {
        let mut session = self.session().await;
        let round = session.require_signable()?;
        let signer = round.state.signer(role);

        session
            .signatures
            .record_signature(role, commitment, signature, signer)?;
        session.phase = session.signed_phase();
        info!(?role, %signer, phase = ?session.phase, "signature recorded");
        Ok(())
    }

    /// Hand the fully signed state to the settlement authority. Only the
    /// recipient of the state may do this. Exactly one successful submission
    /// per round.
    pub async fn submit(&self) -> Result<S::Receipt, ChannelError> {
        let mut session = self.session().await;
        if matches!(session.phase, Phase::Submitted | Phase::Aborted) {
            return Err(ChannelError::InvalidStateTransition {
                required: &[Phase::FullySigned],
                actual: session.phase,
            });
        }
        if let Some(missing) = session.signatures.missing() {
            return Err(ChannelError::IncompleteSignatures { missing });
        }
        session.require(&[Phase::FullySigned])?;
        let round = session.round()?;
        let recipient = round.state.to();

        let active = self.provider.active_identities().await?;
        if !active.contains(&recipient) {
            warn!(expected = %recipient, ?active, "submission by non-recipient refused");
            return Err(ChannelError::UnauthorizedSubmitter {
                expected: recipient,
                active,
            });
        }

        if let Err(e) = session.check_integrity(&round) {
            error!(error = %e, sequence = session.sequence, "aborting round");
            session.phase = Phase::Aborted;
            return Err(e);
        }

        let receipt = self
            .submitter
            .submit(
                &self.authority,
                &round.state,
                &session.signatures.signatures(),
                recipient,
            )
            .await?;
        session.phase = Phase::Submitted;
        Ok(receipt)
    }

    /// Start the next round with the same parties after a successful
    /// submission.
    pub async fn next_round(&self) -> Result<u64, ChannelError> {
        let mut session = self.session().await;
        session.require(&[Phase::Submitted])?;
        let sequence = session.sequence.checked_add(1).ok_or(ChannelError::InvalidState(
            InvalidStateReason::SequenceExhausted(session.sequence),
        ))?;
        *session = Session::new(session.parties, sequence);
        info!(sequence, "next round");
        Ok(sequence)
    }

    pub async fn status(&self) -> ChannelStatus {
        let session = self.session().await;
        let signatures = match session.round {
            Some(round) if session.signatures.commitment() == Some(round.commitment) => {
                session.signatures.signatures()
            }
            _ => SignatureSet::default(),
        };
        ChannelStatus {
            phase: session.phase,
            parties: session.parties,
            sequence: session.sequence,
            pending_to_b: session.transfers.total(Direction::AToB),
            pending_to_a: session.transfers.total(Direction::BToA),
            net: session.transfers.net_delta(),
            round: session.round,
            signatures,
        }
    }
}
