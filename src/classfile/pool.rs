//! The constant pool of one class.
//!
//! The pipeline never rebuilds a pool: the parsed pool is carried through the
//! pass untouched, so pool indices inside original method bodies and opaque
//! attributes stay valid, and the writer appends whatever new entries the
//! synthesized members need.

use anyhow::{anyhow, Result};
use bytes::{BufMut, Bytes, BytesMut};

use crate::classfile::buf::{try_split, SafeBuf};

mod tag {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELD_REF: u8 = 9;
    pub const METHOD_REF: u8 = 10;
    pub const INTERFACE_METHOD_REF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// Numeric entries keep their raw bit patterns so a pass that never touches
/// them round-trips byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEntry {
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name: u16 },
    String { utf8: u16 },
    FieldRef { class: u16, name_and_type: u16 },
    MethodRef { class: u16, name_and_type: u16 },
    InterfaceMethodRef { class: u16, name_and_type: u16 },
    NameAndType { name: u16, descriptor: u16 },
    MethodHandle { kind: u8, reference: u16 },
    MethodType { descriptor: u16 },
    Dynamic { bootstrap_method: u16, name_and_type: u16 },
    InvokeDynamic { bootstrap_method: u16, name_and_type: u16 },
    Module { name: u16 },
    Package { name: u16 },
    /// Second slot of a long or double; never addressed directly.
    Reserved,
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(bytes: &mut Bytes) -> Result<Self> {
        let count = bytes.try_get_u16()?;
        let mut pool = ConstantPool::new();

        let mut i = 0;
        while i < count.saturating_sub(1) {
            let tag = bytes.try_get_u8()?;
            let entry = match tag {
                tag::UTF8 => {
                    let length = bytes.try_get_u16()?;
                    PoolEntry::Utf8(try_split(bytes, length.into())?.to_vec())
                }
                tag::INTEGER => PoolEntry::Integer(bytes.try_get_u32()?),
                tag::FLOAT => PoolEntry::Float(bytes.try_get_u32()?),
                tag::LONG => {
                    let high = bytes.try_get_u32()?;
                    let low = bytes.try_get_u32()?;
                    PoolEntry::Long(u64::from(high) << 32 | u64::from(low))
                }
                tag::DOUBLE => {
                    let high = bytes.try_get_u32()?;
                    let low = bytes.try_get_u32()?;
                    PoolEntry::Double(u64::from(high) << 32 | u64::from(low))
                }
                tag::CLASS => PoolEntry::Class {
                    name: bytes.try_get_u16()?,
                },
                tag::STRING => PoolEntry::String {
                    utf8: bytes.try_get_u16()?,
                },
                tag::FIELD_REF => PoolEntry::FieldRef {
                    class: bytes.try_get_u16()?,
                    name_and_type: bytes.try_get_u16()?,
                },
                tag::METHOD_REF => PoolEntry::MethodRef {
                    class: bytes.try_get_u16()?,
                    name_and_type: bytes.try_get_u16()?,
                },
                tag::INTERFACE_METHOD_REF => PoolEntry::InterfaceMethodRef {
                    class: bytes.try_get_u16()?,
                    name_and_type: bytes.try_get_u16()?,
                },
                tag::NAME_AND_TYPE => PoolEntry::NameAndType {
                    name: bytes.try_get_u16()?,
                    descriptor: bytes.try_get_u16()?,
                },
                tag::METHOD_HANDLE => PoolEntry::MethodHandle {
                    kind: bytes.try_get_u8()?,
                    reference: bytes.try_get_u16()?,
                },
                tag::METHOD_TYPE => PoolEntry::MethodType {
                    descriptor: bytes.try_get_u16()?,
                },
                tag::DYNAMIC => PoolEntry::Dynamic {
                    bootstrap_method: bytes.try_get_u16()?,
                    name_and_type: bytes.try_get_u16()?,
                },
                tag::INVOKE_DYNAMIC => PoolEntry::InvokeDynamic {
                    bootstrap_method: bytes.try_get_u16()?,
                    name_and_type: bytes.try_get_u16()?,
                },
                tag::MODULE => PoolEntry::Module {
                    name: bytes.try_get_u16()?,
                },
                tag::PACKAGE => PoolEntry::Package {
                    name: bytes.try_get_u16()?,
                },
                _ => return Err(anyhow!("unknown constant pool tag {}", tag)),
            };

            // 64 bit constants take up two pool slots, the second of which
            // must never be addressed
            let wide = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            pool.push(entry)?;

            if wide {
                pool.push(PoolEntry::Reserved)?;
                i += 1;
            }

            i += 1;
        }

        Ok(pool)
    }

    /// The on-disk count field: number of slots plus one.
    pub fn count(&self) -> u16 {
        self.entries.len() as u16 + 1
    }

    pub fn get(&self, index: u16) -> Result<&PoolEntry> {
        if index == 0 {
            return Err(anyhow!("constant pool index 0 is reserved"));
        }

        self.entries
            .get(usize::from(index) - 1)
            .ok_or_else(|| anyhow!("constant pool index {} out of range", index))
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            PoolEntry::Utf8(bytes) => std::str::from_utf8(bytes)
                .map_err(|_| anyhow!("utf8 entry {} is not valid utf8", index)),
            other => Err(anyhow!("entry {} was not utf8, got {:?}", index, other)),
        }
    }

    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            PoolEntry::Class { name } => self.utf8(*name),
            other => Err(anyhow!("entry {} was not a class, got {:?}", index, other)),
        }
    }

    fn push(&mut self, entry: PoolEntry) -> Result<u16> {
        if self.entries.len() >= usize::from(u16::MAX) - 1 {
            return Err(anyhow!("constant pool overflow"));
        }

        self.entries.push(entry);
        Ok(self.entries.len() as u16)
    }

    fn find_or_push(&mut self, entry: PoolEntry) -> Result<u16> {
        for (i, existing) in self.entries.iter().enumerate() {
            if *existing == entry {
                return Ok(i as u16 + 1);
            }
        }

        self.push(entry)
    }

    pub fn utf8_index(&mut self, value: &str) -> Result<u16> {
        self.find_or_push(PoolEntry::Utf8(value.as_bytes().to_vec()))
    }

    pub fn class_index(&mut self, class_name: &str) -> Result<u16> {
        let name = self.utf8_index(class_name)?;
        self.find_or_push(PoolEntry::Class { name })
    }

    pub fn name_and_type_index(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let name = self.utf8_index(name)?;
        let descriptor = self.utf8_index(descriptor)?;
        self.find_or_push(PoolEntry::NameAndType { name, descriptor })
    }

    pub fn field_ref_index(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class = self.class_index(owner)?;
        let name_and_type = self.name_and_type_index(name, descriptor)?;
        self.find_or_push(PoolEntry::FieldRef {
            class,
            name_and_type,
        })
    }

    pub fn method_ref_index(&mut self, owner: &str, name: &str, descriptor: &str) -> Result<u16> {
        let class = self.class_index(owner)?;
        let name_and_type = self.name_and_type_index(name, descriptor)?;
        self.find_or_push(PoolEntry::MethodRef {
            class,
            name_and_type,
        })
    }

    pub fn encode(&self, out: &mut BytesMut) {
        out.put_u16(self.count());

        for entry in &self.entries {
            match entry {
                PoolEntry::Utf8(bytes) => {
                    out.put_u8(tag::UTF8);
                    out.put_u16(bytes.len() as u16);
                    out.put_slice(bytes);
                }
                PoolEntry::Integer(bits) => {
                    out.put_u8(tag::INTEGER);
                    out.put_u32(*bits);
                }
                PoolEntry::Float(bits) => {
                    out.put_u8(tag::FLOAT);
                    out.put_u32(*bits);
                }
                PoolEntry::Long(bits) => {
                    out.put_u8(tag::LONG);
                    out.put_u64(*bits);
                }
                PoolEntry::Double(bits) => {
                    out.put_u8(tag::DOUBLE);
                    out.put_u64(*bits);
                }
                PoolEntry::Class { name } => {
                    out.put_u8(tag::CLASS);
                    out.put_u16(*name);
                }
                PoolEntry::String { utf8 } => {
                    out.put_u8(tag::STRING);
                    out.put_u16(*utf8);
                }
                PoolEntry::FieldRef {
                    class,
                    name_and_type,
                } => {
                    out.put_u8(tag::FIELD_REF);
                    out.put_u16(*class);
                    out.put_u16(*name_and_type);
                }
                PoolEntry::MethodRef {
                    class,
                    name_and_type,
                } => {
                    out.put_u8(tag::METHOD_REF);
                    out.put_u16(*class);
                    out.put_u16(*name_and_type);
                }
                PoolEntry::InterfaceMethodRef {
                    class,
                    name_and_type,
                } => {
                    out.put_u8(tag::INTERFACE_METHOD_REF);
                    out.put_u16(*class);
                    out.put_u16(*name_and_type);
                }
                PoolEntry::NameAndType { name, descriptor } => {
                    out.put_u8(tag::NAME_AND_TYPE);
                    out.put_u16(*name);
                    out.put_u16(*descriptor);
                }
                PoolEntry::MethodHandle { kind, reference } => {
                    out.put_u8(tag::METHOD_HANDLE);
                    out.put_u8(*kind);
                    out.put_u16(*reference);
                }
                PoolEntry::MethodType { descriptor } => {
                    out.put_u8(tag::METHOD_TYPE);
                    out.put_u16(*descriptor);
                }
                PoolEntry::Dynamic {
                    bootstrap_method,
                    name_and_type,
                } => {
                    out.put_u8(tag::DYNAMIC);
                    out.put_u16(*bootstrap_method);
                    out.put_u16(*name_and_type);
                }
                PoolEntry::InvokeDynamic {
                    bootstrap_method,
                    name_and_type,
                } => {
                    out.put_u8(tag::INVOKE_DYNAMIC);
                    out.put_u16(*bootstrap_method);
                    out.put_u16(*name_and_type);
                }
                PoolEntry::Module { name } => {
                    out.put_u8(tag::MODULE);
                    out.put_u16(*name);
                }
                PoolEntry::Package { name } => {
                    out.put_u8(tag::PACKAGE);
                    out.put_u16(*name);
                }
                PoolEntry::Reserved => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut pool = ConstantPool::new();

        let a = pool.method_ref_index("Foo", "bar", "()V").unwrap();
        let b = pool.method_ref_index("Foo", "bar", "()V").unwrap();
        assert_eq!(a, b);

        // shares the Foo class entry, adds a new name and type
        let c = pool.method_ref_index("Foo", "baz", "()V").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn wide_constants_occupy_two_slots() {
        let mut bytes = BytesMut::new();
        bytes.put_u16(4); // count: long (2 slots) + utf8
        bytes.put_u8(5);
        bytes.put_u64(0xDEAD_BEEF_CAFE_BABE);
        bytes.put_u8(1);
        bytes.put_u16(2);
        bytes.put_slice(b"hi");

        let pool = ConstantPool::parse(&mut bytes.freeze()).unwrap();
        assert_eq!(pool.count(), 4);
        assert_eq!(pool.utf8(3).unwrap(), "hi");
        assert!(matches!(pool.get(2).unwrap(), PoolEntry::Reserved));
    }

    #[test]
    fn round_trips_through_encode() {
        let mut pool = ConstantPool::new();
        pool.field_ref_index("Foo", "x", "I").unwrap();

        let mut out = BytesMut::new();
        pool.encode(&mut out);

        let reparsed = ConstantPool::parse(&mut out.freeze()).unwrap();
        assert_eq!(reparsed.count(), pool.count());
        assert_eq!(reparsed.utf8(1).unwrap(), "Foo");
    }
}
