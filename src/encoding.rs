use std::io::{self, Write};

use crate::crypto::PublicKey;

/// Graphene binary representation, the bytes that get hashed and signed.
/// careful: field order and integer widths must match the node exactly.
pub trait GrapheneSerialize {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.graphene_serialize(&mut buf)
            .expect("writing to a Vec cannot fail");
        buf
    }
}

/// Unsigned LEB128, used for every length prefix and operation tag.
pub fn write_varint<W: Write>(writer: &mut W, mut value: u64) -> io::Result<()> {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_all(&[byte])?;
        if value == 0 {
            return Ok(());
        }
    }
}

// --- Primitives ---

impl GrapheneSerialize for u8 {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[*self])
    }
}

impl GrapheneSerialize for u16 {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl GrapheneSerialize for u32 {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl GrapheneSerialize for i64 {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl GrapheneSerialize for str {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let bytes = self.as_bytes();
        write_varint(writer, bytes.len() as u64)?;
        writer.write_all(bytes)
    }
}

impl GrapheneSerialize for String {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.as_str().graphene_serialize(writer)
    }
}

impl<T: GrapheneSerialize> GrapheneSerialize for Vec<T> {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_varint(writer, self.len() as u64)?;
        for item in self {
            item.graphene_serialize(writer)?;
        }
        Ok(())
    }
}

impl<T: GrapheneSerialize> GrapheneSerialize for Option<T> {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Some(value) => {
                writer.write_all(&[1])?;
                value.graphene_serialize(writer)
            }
            None => writer.write_all(&[0]),
        }
    }
}

impl<A: GrapheneSerialize, B: GrapheneSerialize> GrapheneSerialize for (A, B) {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.0.graphene_serialize(writer)?;
        self.1.graphene_serialize(writer)
    }
}

impl GrapheneSerialize for PublicKey {
    fn graphene_serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }
}
