//! Serde Serializer for Solidity's non-standard packed mode.
//!
//! Packed encoding is what `abi.encodePacked(...)` (and web3's
//! `soliditySha3`) produces: every value is written at its natural width, one
//! after the other, without the 32 byte slots, offsets and length prefixes of
//! the standard ABI encoding. Consequently there are no head/tail passes and
//! every struct, tuple or newtype is transparent: only the leaves write
//! anything.
//!
//! The types in [types][super::types] decide their own width by calling
//! [serialize_bytes][ser::Serializer::serialize_bytes] with the exact bytes
//! they need (20 for `address`, 32 for `uint256`/`bytes32`), which is also why
//! the Serializer reports itself as not human readable.

use super::error::{Error, Result};
use serde::{
    ser::{self, Impossible, SerializeStruct, SerializeTuple, SerializeTupleStruct},
    Serialize,
};

/// Receives the encoded output, one chunk per leaf value.
pub trait Writer {
    fn write(&mut self, chunk: &[u8]);
}

pub struct Serializer<'a, W>
where
    W: Writer,
{
    writer: &'a mut W,
}

pub fn to_writer<T, W>(value: &T, writer: &mut W) -> Result<()>
where
    T: Serialize + ?Sized,
    W: Writer,
{
    let mut serializer = Serializer { writer };
    value.serialize(&mut serializer)
}

impl<'a, W> Serializer<'a, W>
where
    W: Writer,
{
    fn write(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer.write(chunk);
        Ok(())
    }
}

impl<'a, 'b, W> ser::Serializer for &'b mut Serializer<'a, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Impossible<(), Error>;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), Error>;

    fn is_human_readable(&self) -> bool {
        false
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write(&[v as u8])
    }

    // Signed integers are two's complement at their natural width, which is
    // exactly what to_be_bytes gives us.
    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.write(&v.to_be_bytes())
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(Error::TypeNotRepresentable("f32"))
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(Error::TypeNotRepresentable("f64"))
    }

    fn serialize_char(self, _v: char) -> Result<()> {
        Err(Error::TypeNotYetSupported("char"))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write(v.as_bytes())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write(v)
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::TypeNotRepresentable("Option"))
    }

    fn serialize_some<T>(self, _value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::TypeNotRepresentable("Option"))
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::TypeNotRepresentable("()"))
    }

    // Empty structs contribute nothing.
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        Err(Error::TypeNotRepresentable("enum"))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::TypeNotRepresentable("enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::TypeNotYetSupported("dynamic array"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::TypeNotRepresentable("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::TypeNotRepresentable("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::TypeNotRepresentable("enum"))
    }
}

impl<'a, 'b, W> SerializeTuple for &'b mut Serializer<'a, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, W> SerializeTupleStruct for &'b mut Serializer<'a, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, W> SerializeStruct for &'b mut Serializer<'a, W>
where
    W: Writer,
{
    type Ok = ();
    type Error = Error;

    // Field names are not part of the encoding, only their order is.
    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
