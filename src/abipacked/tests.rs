use super::types::{Address, Hash, U256};
use super::*;
use serde::Serialize;

use core::fmt::Debug;

/*
Expected values below were produced with web3.utils.soliditySha3 /
abi.encodePacked on the listed argument types. Each line is one chunk written
by the Serializer (one leaf value), optionally followed by a comment.
*/

struct AssertWriter<'a, I>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    expected_iter: I,
}

struct Chunk<'a>(&'a [u8]);

impl<'a> Debug for Chunk<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in self.0 {
            f.write_fmt(format_args!("{:02x}", b))?;
        }
        Ok(())
    }
}

impl<'a> PartialEq for Chunk<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'a, I> Writer for AssertWriter<'a, I>
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    fn write(&mut self, chunk: &[u8]) {
        match self.expected_iter.next() {
            Some((expected, line)) => {
                println!("{}", line);
                let expected = hex::decode(expected).expect("expected chunk must be hex");
                assert_eq!(
                    Chunk(chunk),
                    Chunk(expected.as_slice()),
                    "chunk did not match the expected value"
                );
            }
            None => {
                panic!("Expected end of data, got {:?}", Chunk(chunk));
            }
        }
    }
}

fn serialize_and_compare<T>(value: &T, expected: &str)
where
    T: Serialize,
{
    // Everything up to the first whitespace is the chunk, the rest of the line
    // is free-form explanation.
    let expected_iter = expected
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim();
            let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
            (&trimmed[..end], line)
        });
    let mut writer = AssertWriter { expected_iter };
    to_writer(value, &mut writer).unwrap();

    let next = writer.expected_iter.next();
    assert_eq!(next, None, "there are less chunks than expected.");
}

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

#[derive(Serialize, Debug)]
struct Commitment {
    from: Address,
    to: Address,
    amount: U256,
    nonce: U256,
}

fn commitment_fixture() -> Commitment {
    Commitment {
        from: addr("0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5"),
        to: addr("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"),
        amount: U256::from(3),
        nonce: U256::zero(),
    }
}

#[test]
fn address_address_uint256_uint256() {
    let expected = "
    95222290dd7278aa3ddd389cc1e1d165cc4bafe5                           from (20 bytes, no padding)
    5aaeb6053f3e94c9b9a09f33669435e7ef1beaed                           to
    0000000000000000000000000000000000000000000000000000000000000003   amount
    0000000000000000000000000000000000000000000000000000000000000000   nonce
    ";
    serialize_and_compare(&commitment_fixture(), expected);
}

#[test]
fn hash_matches_solidity_sha3() {
    // soliditySha3({t:'address',v:from},{t:'address',v:to},{t:'uint256',v:3},{t:'uint256',v:0})
    let hash = to_hash(&commitment_fixture()).unwrap();
    assert_eq!(
        hash.to_string(),
        "0x6fc088f99c6e121adc7e946748a050865a0370fb33a2078060905fcc4649c145"
    );
}

#[test]
fn empty_input_hash() {
    #[derive(Serialize)]
    struct Empty;

    assert_eq!(
        to_hash(&Empty).unwrap(),
        Hash(
            <[u8; 32]>::try_from(
                hex::decode("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
                    .unwrap()
            )
            .unwrap()
        )
    );
}

#[test]
fn natural_width_integers() {
    #[derive(Serialize)]
    struct Widths {
        a: u8,
        b: u16,
        c: u64,
        d: i32,
        e: bool,
    }

    let d = Widths {
        a: 0x42,
        b: 0x1337,
        c: 0x1337000012341111,
        d: -2,
        e: true,
    };

    let expected = "
    42                 uint8
    1337               uint16
    1337000012341111   uint64
    fffffffe           int32
    01                 bool
    ";
    serialize_and_compare(&d, expected);
}

#[test]
fn strings_and_tuples_are_raw() {
    let d = ("abc", (0x01u8, 0x0203u16));

    let expected = "
    616263   string
    01
    0203
    ";
    serialize_and_compare(&d, expected);
}

#[test]
fn newtype_is_transparent() {
    #[derive(Serialize)]
    struct Wrapped(U256);

    let expected = "
    00000000000000000000000000000000000000000000000000000000000000ff
    ";
    serialize_and_compare(&Wrapped(U256::from(255)), expected);
}

#[test]
fn unrepresentable_types() {
    #[derive(Serialize)]
    enum Kind {
        A,
    }

    let mut writer = hashing::Keccak256Writer::default();
    assert_eq!(
        to_writer(&1.5f64, &mut writer),
        Err(Error::TypeNotRepresentable("f64"))
    );
    assert_eq!(
        to_writer(&Some(1u8), &mut writer),
        Err(Error::TypeNotRepresentable("Option"))
    );
    assert_eq!(
        to_writer(&Kind::A, &mut writer),
        Err(Error::TypeNotRepresentable("enum"))
    );
    assert_eq!(
        to_writer(&vec![1u8, 2], &mut writer),
        Err(Error::TypeNotYetSupported("dynamic array"))
    );
}
