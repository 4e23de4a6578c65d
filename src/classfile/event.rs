//! The structural event stream describing one class definition.
//!
//! A parsed class becomes an ordered buffer of these events; every pipeline
//! stage consumes the buffer event by event and emits zero or more events
//! downstream. Attribute payloads are carried opaquely: their constant pool
//! indices stay valid because the pool is extended, never rebuilt.

use bytes::Bytes;
use enum_as_inner::EnumAsInner;

use crate::classfile::code::Insn;
use crate::structs::bitflag::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

#[derive(Debug, Clone)]
pub struct AttributeEntry {
    pub name_index: u16,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct ClassHeader {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: ClassAccessFlags,
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub access_flags: FieldAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<AttributeEntry>,
}

/// A method declaration. Carries everything but the `Code` attribute, which
/// streams separately as a [`Code`] event so stages can rewrite bodies
/// without touching the declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub access_flags: MethodAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<AttributeEntry>,
}

#[derive(Debug, Clone)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// An original method body, kept as undecoded bytecode. Its pool indices
/// remain valid for the whole pass.
#[derive(Debug, Clone)]
pub struct RawBody {
    pub code: Bytes,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeEntry>,
}

/// The body of one method: synthesized instructions encoded ahead of an
/// optional raw body. A freshly synthesized method has `raw: None`; a body
/// the pipeline merely forwards has empty `insns`.
#[derive(Debug, Clone, Default)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub insns: Vec<Insn>,
    pub raw: Option<RawBody>,
}

#[derive(EnumAsInner, Debug, Clone)]
pub enum ClassEvent {
    Header(ClassHeader),
    Field(FieldDecl),
    MethodStart(MethodDecl),
    Code(Code),
    MethodEnd,
    End(Vec<AttributeEntry>),
}
