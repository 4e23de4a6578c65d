//! access flag sets for the structures in a class definition
//! unknown bits are dropped with a warning rather than failing the parse,
//! so classes emitted by newer compilers still go through the pipeline

use bitflags::bitflags;
use tracing::warn;

bitflags! {
    pub struct ClassAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

bitflags! {
    pub struct FieldAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const VOLATILE = 0x0040;
        const TRANSIENT = 0x0080;
        const SYNTHETIC = 0x1000;
        const ENUM = 0x4000;
    }
}

bitflags! {
    pub struct MethodAccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SYNCHRONIZED = 0x0020;
        const BRIDGE = 0x0040;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const ABSTRACT = 0x0400;
        const STRICT_FP = 0x0800;
        const SYNTHETIC = 0x1000;
    }
}

macro_rules! impl_checked_parse {
    ( $($flag_type:ident),* ) => {
        $(
            impl $flag_type {
                pub fn parse(raw: u16) -> Self {
                    match <$flag_type>::from_bits(raw) {
                        Some(flags) => flags,
                        None => {
                            warn!("unrecognised bits {:b} for {}", raw, stringify!($flag_type));
                            <$flag_type>::from_bits_truncate(raw)
                        }
                    }
                }
            }
        )*
    };
}

impl_checked_parse!(ClassAccessFlags, FieldAccessFlags, MethodAccessFlags);

impl ClassAccessFlags {
    pub fn is_interface(&self) -> bool {
        self.contains(ClassAccessFlags::INTERFACE)
    }
}
