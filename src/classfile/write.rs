//! Serializes a rewritten event stream back to class bytes.
//!
//! The writer owns the derived metadata the format requires: it encodes
//! synthesized instruction sequences, computes their operand stack needs, and
//! when a prologue is spliced ahead of an original body it shifts every
//! program counter that the surrounding tables recorded against that body.

use anyhow::{anyhow, Result};
use bytes::{BufMut, Bytes, BytesMut};

use crate::classfile::buf::SafeBuf;
use crate::classfile::code;
use crate::classfile::event::{
    AttributeEntry, ClassEvent, ClassHeader, Code, FieldDecl, MethodDecl,
};
use crate::classfile::pool::ConstantPool;
use crate::classfile::{
    ATTR_CODE, ATTR_LINE_NUMBER_TABLE, ATTR_LOCAL_VARIABLE_TABLE, ATTR_LOCAL_VARIABLE_TYPE_TABLE,
    ATTR_STACK_MAP_TABLE, MAGIC,
};

pub struct ClassFileWriter {
    pool: ConstantPool,
}

impl ClassFileWriter {
    pub fn new(pool: ConstantPool) -> Self {
        Self { pool }
    }

    pub fn write(mut self, events: &[ClassEvent]) -> Result<Vec<u8>> {
        let mut header: Option<&ClassHeader> = None;
        let mut fields: Vec<&FieldDecl> = Vec::new();
        let mut methods: Vec<(&MethodDecl, Option<&Code>)> = Vec::new();
        let mut class_attributes: Option<&[AttributeEntry]> = None;
        let mut open: Option<(&MethodDecl, Option<&Code>)> = None;

        for event in events {
            match event {
                ClassEvent::Header(h) => {
                    if header.replace(h).is_some() {
                        return Err(anyhow!("event stream has two class headers"));
                    }
                }
                ClassEvent::Field(f) => fields.push(f),
                ClassEvent::MethodStart(m) => {
                    if open.is_some() {
                        return Err(anyhow!("method event inside an unfinished method"));
                    }
                    open = Some((m, None));
                }
                ClassEvent::Code(c) => match &mut open {
                    Some((_, slot @ None)) => *slot = Some(c),
                    Some((m, Some(_))) => {
                        return Err(anyhow!("method '{}' emitted two bodies", m.name))
                    }
                    None => return Err(anyhow!("code event outside a method")),
                },
                ClassEvent::MethodEnd => {
                    let method = open
                        .take()
                        .ok_or_else(|| anyhow!("method end without a method start"))?;
                    methods.push(method);
                }
                ClassEvent::End(attrs) => class_attributes = Some(attrs.as_slice()),
            }
        }

        let header = header.ok_or_else(|| anyhow!("event stream is missing the class header"))?;
        let class_attributes =
            class_attributes.ok_or_else(|| anyhow!("event stream is missing the class end"))?;
        if open.is_some() {
            return Err(anyhow!("event stream ended inside a method"));
        }

        // Encode members first: interning has to land in the pool before the
        // pool itself is written.
        let mut field_buf = BytesMut::new();
        for field in &fields {
            self.encode_field(field, &mut field_buf)?;
        }

        let mut method_buf = BytesMut::new();
        for (decl, code) in &methods {
            self.encode_method(decl, *code, &mut method_buf)?;
        }

        let this_class = self.pool.class_index(&header.name)?;
        let super_class = match &header.super_name {
            Some(name) => self.pool.class_index(name)?,
            None => 0,
        };
        let mut interface_indices = Vec::with_capacity(header.interfaces.len());
        for name in &header.interfaces {
            interface_indices.push(self.pool.class_index(name)?);
        }

        let mut out = BytesMut::new();
        out.put_u32(MAGIC);
        out.put_u16(header.minor_version);
        out.put_u16(header.major_version);

        self.pool.encode(&mut out);

        out.put_u16(header.access_flags.bits());
        out.put_u16(this_class);
        out.put_u16(super_class);

        out.put_u16(interface_indices.len() as u16);
        for index in interface_indices {
            out.put_u16(index);
        }

        out.put_u16(fields.len() as u16);
        out.put_slice(&field_buf);

        out.put_u16(methods.len() as u16);
        out.put_slice(&method_buf);

        put_attributes(&mut out, class_attributes);

        Ok(out.to_vec())
    }

    fn encode_field(&mut self, field: &FieldDecl, out: &mut BytesMut) -> Result<()> {
        out.put_u16(field.access_flags.bits());
        out.put_u16(self.pool.utf8_index(&field.name)?);
        out.put_u16(self.pool.utf8_index(&field.descriptor)?);
        put_attributes(out, &field.attributes);
        Ok(())
    }

    fn encode_method(
        &mut self,
        decl: &MethodDecl,
        code: Option<&Code>,
        out: &mut BytesMut,
    ) -> Result<()> {
        out.put_u16(decl.access_flags.bits());
        out.put_u16(self.pool.utf8_index(&decl.name)?);
        out.put_u16(self.pool.utf8_index(&decl.descriptor)?);

        let code_attr = match code {
            Some(code) => Some(self.encode_code(code)?),
            None => None,
        };

        out.put_u16((decl.attributes.len() + usize::from(code_attr.is_some())) as u16);
        if let Some(data) = code_attr {
            out.put_u16(self.pool.utf8_index(ATTR_CODE)?);
            out.put_u32(data.len() as u32);
            out.put_slice(&data);
        }
        for attribute in &decl.attributes {
            out.put_u16(attribute.name_index);
            out.put_u32(attribute.data.len() as u32);
            out.put_slice(&attribute.data);
        }

        Ok(())
    }

    fn encode_code(&mut self, code: &Code) -> Result<BytesMut> {
        let (insn_bytes, insn_stack) = code::encode(&code.insns, &mut self.pool)?;
        let shift = u16::try_from(insn_bytes.len())
            .map_err(|_| anyhow!("synthesized code sequence too long"))?;

        let mut out = BytesMut::new();
        out.put_u16(code.max_stack.max(insn_stack));
        out.put_u16(code.max_locals);

        match &code.raw {
            Some(raw) => {
                let total = insn_bytes.len() + raw.code.len();
                out.put_u32(u32::try_from(total)?);
                out.put_slice(&insn_bytes);
                out.put_slice(&raw.code);

                out.put_u16(raw.exception_table.len() as u16);
                for entry in &raw.exception_table {
                    out.put_u16(shift_pc(entry.start_pc, shift)?);
                    out.put_u16(shift_pc(entry.end_pc, shift)?);
                    out.put_u16(shift_pc(entry.handler_pc, shift)?);
                    out.put_u16(entry.catch_type);
                }

                out.put_u16(raw.attributes.len() as u16);
                for attribute in &raw.attributes {
                    let data = if shift == 0 {
                        attribute.data.clone()
                    } else {
                        self.shift_code_attribute(attribute, shift)?
                    };

                    out.put_u16(attribute.name_index);
                    out.put_u32(data.len() as u32);
                    out.put_slice(&data);
                }
            }
            None => {
                out.put_u32(insn_bytes.len() as u32);
                out.put_slice(&insn_bytes);
                out.put_u16(0); // exception table
                out.put_u16(0); // attributes
            }
        }

        Ok(out)
    }

    /// Rewrites the program counters a Code sub-attribute recorded against
    /// the original body, now that `shift` bytes sit in front of it.
    fn shift_code_attribute(&self, attribute: &AttributeEntry, shift: u16) -> Result<Bytes> {
        match self.pool.utf8(attribute.name_index)? {
            ATTR_STACK_MAP_TABLE => shift_stack_map(attribute.data.clone(), shift),
            ATTR_LINE_NUMBER_TABLE => shift_pc_table(attribute.data.clone(), shift, 4),
            ATTR_LOCAL_VARIABLE_TABLE | ATTR_LOCAL_VARIABLE_TYPE_TABLE => {
                shift_pc_table(attribute.data.clone(), shift, 10)
            }
            _ => Ok(attribute.data.clone()),
        }
    }
}

fn put_attributes(out: &mut BytesMut, attributes: &[AttributeEntry]) {
    out.put_u16(attributes.len() as u16);
    for attribute in attributes {
        out.put_u16(attribute.name_index);
        out.put_u32(attribute.data.len() as u32);
        out.put_slice(&attribute.data);
    }
}

fn shift_pc(pc: u16, shift: u16) -> Result<u16> {
    pc.checked_add(shift)
        .ok_or_else(|| anyhow!("program counter overflow while splicing"))
}

/// Shifts a table of fixed-size entries whose first u16 is a program counter
/// (LineNumberTable entries are 4 bytes, LocalVariableTable entries 10).
fn shift_pc_table(mut data: Bytes, shift: u16, entry_size: usize) -> Result<Bytes> {
    let mut out = BytesMut::with_capacity(data.len());

    let count = data.try_get_u16()?;
    out.put_u16(count);

    for _ in 0..count {
        if data.len() < entry_size {
            return Err(anyhow!("truncated pc table"));
        }
        out.put_u16(shift_pc(data.try_get_u16()?, shift)?);
        for _ in 0..entry_size - 2 {
            out.put_u8(data.try_get_u8()?);
        }
    }

    out.put_slice(&data);
    Ok(out.freeze())
}

/// Frames are delta-encoded from the start of the code array, so splicing
/// bytes in front of the body only moves the first frame. Compact frame
/// forms whose delta no longer fits are re-encoded as their extended form.
fn shift_stack_map(mut data: Bytes, shift: u16) -> Result<Bytes> {
    let mut out = BytesMut::with_capacity(data.len() + 3);

    let count = data.try_get_u16()?;
    out.put_u16(count);

    if count > 0 {
        let tag = data.try_get_u8()?;
        match tag {
            // same_frame
            0..=63 => {
                let delta = shift_pc(tag.into(), shift)?;
                if delta <= 63 {
                    out.put_u8(delta as u8);
                } else {
                    out.put_u8(251); // same_frame_extended
                    out.put_u16(delta);
                }
            }
            // same_locals_1_stack_item_frame, verification info follows
            64..=127 => {
                let delta = shift_pc((tag - 64).into(), shift)?;
                if delta <= 63 {
                    out.put_u8(delta as u8 + 64);
                } else {
                    out.put_u8(247); // same_locals_1_stack_item_frame_extended
                    out.put_u16(delta);
                }
            }
            // every extended form starts with an explicit u16 delta
            247..=255 => {
                out.put_u8(tag);
                out.put_u16(shift_pc(data.try_get_u16()?, shift)?);
            }
            _ => return Err(anyhow!("reserved stack map frame tag {}", tag)),
        }
    }

    // later frames are relative to the first, copy them verbatim
    out.put_slice(&data);
    Ok(out.freeze())
}
