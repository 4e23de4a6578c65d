//! The small instruction vocabulary the pipeline synthesizes, and its
//! encoding to bytecode. Symbolic member references are resolved by interning
//! into the constant pool at encode time.

use anyhow::{anyhow, Result};
use bytes::{BufMut, Bytes, BytesMut};

use crate::classfile::pool::ConstantPool;
use crate::structs::descriptor::{FieldType, MethodType};

mod opcode {
    pub const ICONST_0: u8 = 0x03;
    pub const BIPUSH: u8 = 0x10;
    pub const SIPUSH: u8 = 0x11;
    pub const DUP: u8 = 0x59;
    pub const RETURN: u8 = 0xB1;
    pub const PUTSTATIC: u8 = 0xB3;
    pub const INVOKESPECIAL: u8 = 0xB7;
    pub const INVOKESTATIC: u8 = 0xB8;
    pub const NEW: u8 = 0xBB;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MemberRef {
    pub fn new(owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    New(String),
    Dup,
    IConst(i32),
    InvokeSpecial(MemberRef),
    InvokeStatic(MemberRef),
    PutStatic(MemberRef),
    Return,
}

/// Encodes `insns`, interning member references into `pool`. Returns the
/// bytecode and the operand stack depth it needs.
pub fn encode(insns: &[Insn], pool: &mut ConstantPool) -> Result<(Bytes, u16)> {
    let mut out = BytesMut::new();
    let mut depth: i32 = 0;
    let mut max_depth: i32 = 0;

    for insn in insns {
        match insn {
            Insn::New(class_name) => {
                out.put_u8(opcode::NEW);
                out.put_u16(pool.class_index(class_name)?);
                depth += 1;
            }
            Insn::Dup => {
                out.put_u8(opcode::DUP);
                depth += 1;
            }
            Insn::IConst(value) => {
                match value {
                    -1..=5 => out.put_u8((opcode::ICONST_0 as i32 + value) as u8),
                    -128..=127 => {
                        out.put_u8(opcode::BIPUSH);
                        out.put_u8(*value as i8 as u8);
                    }
                    -32768..=32767 => {
                        out.put_u8(opcode::SIPUSH);
                        out.put_u16(*value as i16 as u16);
                    }
                    _ => return Err(anyhow!("constant {} needs an ldc, unsupported", value)),
                }
                depth += 1;
            }
            Insn::InvokeSpecial(member) => {
                out.put_u8(opcode::INVOKESPECIAL);
                out.put_u16(pool.method_ref_index(
                    &member.owner,
                    &member.name,
                    &member.descriptor,
                )?);

                let ty = MethodType::parse(&member.descriptor)?;
                depth -= 1 + i32::from(ty.argument_slots());
                depth += i32::from(ty.return_slots());
            }
            Insn::InvokeStatic(member) => {
                out.put_u8(opcode::INVOKESTATIC);
                out.put_u16(pool.method_ref_index(
                    &member.owner,
                    &member.name,
                    &member.descriptor,
                )?);

                let ty = MethodType::parse(&member.descriptor)?;
                depth -= i32::from(ty.argument_slots());
                depth += i32::from(ty.return_slots());
            }
            Insn::PutStatic(member) => {
                out.put_u8(opcode::PUTSTATIC);
                out.put_u16(pool.field_ref_index(
                    &member.owner,
                    &member.name,
                    &member.descriptor,
                )?);

                depth -= i32::from(FieldType::parse(&member.descriptor)?.slot_width());
            }
            Insn::Return => {
                out.put_u8(opcode::RETURN);
            }
        }

        max_depth = max_depth.max(depth);
    }

    Ok((out.freeze(), max_depth as u16))
}
