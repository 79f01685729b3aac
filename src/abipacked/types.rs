use core::{
    fmt::{Debug, Display},
    str::FromStr,
};

use rand::{distributions::Standard, prelude::Distribution};
use serde::{Deserialize, Deserializer, Serialize};
use sha3::{Digest, Keccak256};
use thiserror::Error;
use uint::construct_uint;

#[cfg(feature = "secp256k1")]
use secp256k1::{PublicKey, ThirtyTwoByteHash};

/// Returned when parsing a hex string into one of the fixed-size types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseHexError {
    #[error("expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid hex string: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Accepts an optional `0x`/`0X` prefix and hex digits in any case.
fn parse_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.len() != 2 * N {
        return Err(ParseHexError::InvalidLength {
            expected: 2 * N,
            actual: digits.len(),
        });
    }
    let mut bytes = [0u8; N];
    hex::decode_to_slice(digits, &mut bytes)?;
    Ok(bytes)
}

macro_rules! impl_hex_fmt {
    ($T:ident) => {
        impl Debug for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                Display::fmt(self, f)
            }
        }

        impl Display for $T {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str("0x")?;
                for b in self.0 {
                    f.write_fmt(format_args!("{:02x}", b))?;
                }
                Ok(())
            }
        }

        impl FromStr for $T {
            type Err = ParseHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed(s).map($T)
            }
        }
    };
}

macro_rules! bytesN {
    ( $T:ident, $N:literal ) => {
        #[derive(PartialEq, Eq, Copy, Clone)]
        pub struct $T(pub [u8; $N]);

        impl Serialize for $T {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.collect_str(self)
                } else {
                    serializer.serialize_bytes(&self.0)
                }
            }
        }

        impl Distribution<$T> for Standard {
            fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> $T {
                let mut bytes = [0u8; $N];
                rng.fill(&mut bytes[..]);
                $T(bytes)
            }
        }

        impl Default for $T {
            fn default() -> Self {
                Self([0; $N])
            }
        }

        impl_hex_fmt!($T);
    };
}

bytesN!(Hash, 32);

#[cfg(feature = "secp256k1")]
impl ThirtyTwoByteHash for Hash {
    fn into_32(self) -> [u8; 32] {
        self.0
    }
}

// `r || s || v` as returned by `personal.sign` and expected by `ecrecover`.
bytesN!(Signature, 65);

impl Signature {
    pub fn new(rs: &[u8; 64], v: u8) -> Self {
        let mut sig: Signature = Signature([0; 65]);
        sig.0[..64].copy_from_slice(rs);
        sig.0[64] = v;
        sig
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }
}

// primitive_types::U256 serializes to a hex string, which is not what the
// packed encoding needs, so we construct our own.
construct_uint! {
    pub struct U256(4);
}

impl Serialize for U256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            let mut bytes = [0u8; 32];
            self.to_big_endian(&mut bytes);
            serializer.serialize_bytes(&bytes)
        }
    }
}

impl Distribution<U256> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> U256 {
        let buf: [u8; 32] = rng.gen();
        U256::from_big_endian(&buf)
    }
}

/// 20 byte account address.
///
/// Equality is on the raw bytes, so `0xAB..` and `0xab..` are the same
/// address no matter how the operator typed it.
#[derive(Copy, Clone, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);
impl_hex_fmt!(Address);

impl Address {
    /// Mixed-case rendering from EIP-55.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            // Packed: no left padding to 32 bytes.
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "secp256k1")]
impl From<PublicKey> for Address {
    fn from(pk: PublicKey) -> Self {
        // Throw away the first byte, which is not part of the public key. It is
        // added by serialize_uncompressed due to the encoding used.
        let hash: [u8; 32] = Keccak256::digest(&pk.serialize_uncompressed()[1..]).into();

        let mut addr = Address([0; 20]);
        addr.0.copy_from_slice(&hash[32 - 20..]);
        addr
    }
}

impl Distribution<Address> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Address {
        Address(rng.gen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Checksum example taken from EIP-55.
    const EIP55: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn address_parsing_ignores_case_and_prefix() {
        let mixed: Address = EIP55.parse().unwrap();
        let lower: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();
        let upper: Address = "0X5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED".parse().unwrap();
        let bare: Address = "5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap();

        assert_eq!(mixed, lower);
        assert_eq!(mixed, upper);
        assert_eq!(mixed, bare);
        assert_eq!(
            mixed.to_string(),
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );
    }

    #[test]
    fn address_checksum() {
        let addr: Address = EIP55.parse().unwrap();
        assert_eq!(addr.to_checksum(), EIP55);

        // Random address from etherscan, do not use!
        let addr: Address = "95222290dd7278aa3ddd389cc1e1d165cc4bafe5".parse().unwrap();
        assert_eq!(
            addr.to_checksum(),
            "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5"
        );
    }

    #[test]
    fn address_rejects_bad_input() {
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(ParseHexError::InvalidLength {
                expected: 40,
                actual: 4
            })
        );
        // Right length, so this has to fail in the hex decoder.
        assert_eq!(
            "0xzzaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse::<Address>(),
            Err(ParseHexError::InvalidHex(
                hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 }
            ))
        );
        assert_eq!(
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaedg".parse::<Address>(),
            Err(ParseHexError::InvalidLength {
                expected: 40,
                actual: 41
            })
        );
    }

    #[test]
    fn signature_from_hex() {
        let hex = format!("0x{}1b", "ab".repeat(64));
        let sig: Signature = hex.parse().unwrap();
        assert_eq!(sig.v(), 27);
        assert_eq!(sig.0[0], 0xab);
        assert_eq!(sig.to_string(), hex);
    }
}
