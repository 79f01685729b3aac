//! Signer using the libsecp256k1 bindings.

use crate::abipacked::types::{Address, Hash, Signature};
use secp256k1::{
    self,
    ecdsa::{RecoverableSignature, RecoveryId},
    All, Message, PublicKey, Secp256k1, SecretKey,
};

use super::{hash_to_eth_signed_msg_hash, recovery_id, Error};

#[derive(Debug)]
pub struct Signer {
    secp: Secp256k1<All>,
    key: SecretKey,
    addr: Address,
}

impl Signer {
    pub fn new<R: rand::RngCore + rand::CryptoRng>(rng: &mut R) -> Self {
        let secp = Secp256k1::new();
        let key = SecretKey::new(rng);
        let addr = PublicKey::from_secret_key(&secp, &key).into();
        Self { secp, key, addr }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, Error> {
        let secp = Secp256k1::new();
        let key = SecretKey::from_slice(bytes).map_err(|_| Error::InvalidSecretKey)?;
        let addr = PublicKey::from_secret_key(&secp, &key).into();
        Ok(Self { secp, key, addr })
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    /// Sign a hash using a Ethereum 65-byte recoverable signature.
    ///
    /// Note that this differs from transaction signatures, as it does not
    /// include the chain id in v.
    pub fn sign_eth(&self, msg: Hash) -> Result<Signature, Error> {
        // "\x19Ethereum Signed Message:\n32" format
        let hash = hash_to_eth_signed_msg_hash(msg);

        // Recoverable, because the contract must be able to recover the
        // address. This gives us the additional information needed for v.
        let sig = self
            .secp
            .sign_ecdsa_recoverable(&Message::from(hash), &self.key);

        let (v, rs) = sig.serialize_compact();

        // EIP-2 rejects signatures with a high s. libsecp256k1 already
        // produces canonical ones, fail early if that changes.
        debug_assert!(rs[32] & 0x80 == 0);

        // yParity offset by 27, see EIP-2098.
        let v: u8 = 27 + v.to_i32() as u8;

        Ok(Signature::new(&rs, v))
    }
}

/// Recover the address that produced `eth_sig` over `msg`.
///
/// `msg` is the hash given to [Signer::sign_eth()], without the
/// `Ethereum Signed Message` prefix.
pub fn recover_signer(msg: Hash, eth_sig: Signature) -> Result<Address, Error> {
    let secp = Secp256k1::verification_only();
    let hash = hash_to_eth_signed_msg_hash(msg);

    let rs = &eth_sig.0[..64];
    let v = recovery_id(eth_sig.v())?;

    let recid = RecoveryId::from_i32(v.into()).map_err(|e| Error::Backend(e.to_string()))?;
    let sig =
        RecoverableSignature::from_compact(rs, recid).map_err(|e| Error::Backend(e.to_string()))?;

    let pk = secp
        .recover_ecdsa(&Message::from(hash), &sig)
        .map_err(|e| Error::Backend(e.to_string()))?;

    Ok(pk.into())
}
