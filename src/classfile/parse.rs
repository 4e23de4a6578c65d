//! Turns raw class bytes into the structural event stream.

use anyhow::{anyhow, Result};
use bytes::Bytes;
use tracing::debug;

use crate::classfile::buf::{try_split, SafeBuf};
use crate::classfile::event::{
    AttributeEntry, ClassEvent, ClassHeader, Code, ExceptionTableEntry, FieldDecl, MethodDecl,
    RawBody,
};
use crate::classfile::pool::ConstantPool;
use crate::classfile::{ATTR_CODE, MAGIC};
use crate::structs::bitflag::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

pub struct ClassFileParser {
    bytes: Bytes,
}

/// The result of one parse: the decoded constant pool and the event buffer
/// the pipeline will rewrite. The pool is threaded through to the writer so
/// the indices inside opaque attributes and raw bodies stay valid.
pub struct ParsedClass {
    pub pool: ConstantPool,
    pub events: Vec<ClassEvent>,
}

impl ParsedClass {
    pub fn class_name(&self) -> Result<&str> {
        match self.events.first() {
            Some(ClassEvent::Header(header)) => Ok(&header.name),
            _ => Err(anyhow!("event stream does not start with a class header")),
        }
    }
}

impl ClassFileParser {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    pub fn parse(mut self) -> Result<ParsedClass> {
        let magic = self.bytes.try_get_u32()?;

        if magic != MAGIC {
            return Err(anyhow!("magic value not present or not matching"));
        }

        let minor_version = self.bytes.try_get_u16()?;
        let major_version = self.bytes.try_get_u16()?;

        let pool = ConstantPool::parse(&mut self.bytes)?;

        let access_flags = ClassAccessFlags::parse(self.bytes.try_get_u16()?);
        let this_class = self.bytes.try_get_u16()?;
        let name = pool.class_name(this_class)?.to_string();

        debug!("parsing class '{}' (version {}.{})", name, major_version, minor_version);

        let super_class = self.bytes.try_get_u16()?;
        let super_name = if super_class == 0 {
            None
        } else {
            Some(pool.class_name(super_class)?.to_string())
        };

        let interface_count = self.bytes.try_get_u16()?;
        let mut interfaces = Vec::with_capacity(interface_count.into());
        for _ in 0..interface_count {
            let index = self.bytes.try_get_u16()?;
            interfaces.push(pool.class_name(index)?.to_string());
        }

        let mut events = Vec::new();
        events.push(ClassEvent::Header(ClassHeader {
            minor_version,
            major_version,
            access_flags,
            name,
            super_name,
            interfaces,
        }));

        let field_count = self.bytes.try_get_u16()?;
        for _ in 0..field_count {
            let access_flags = FieldAccessFlags::parse(self.bytes.try_get_u16()?);
            let name = pool.utf8(self.bytes.try_get_u16()?)?.to_string();
            let descriptor = pool.utf8(self.bytes.try_get_u16()?)?.to_string();
            let attributes = self.parse_attributes()?;

            events.push(ClassEvent::Field(FieldDecl {
                access_flags,
                name,
                descriptor,
                attributes,
            }));
        }

        let method_count = self.bytes.try_get_u16()?;
        for _ in 0..method_count {
            let access_flags = MethodAccessFlags::parse(self.bytes.try_get_u16()?);
            let name = pool.utf8(self.bytes.try_get_u16()?)?.to_string();
            let descriptor = pool.utf8(self.bytes.try_get_u16()?)?.to_string();
            let attributes = self.parse_attributes()?;

            // The Code attribute streams as its own event; everything else
            // stays on the declaration.
            let mut code = None;
            let mut rest = Vec::with_capacity(attributes.len());
            for attribute in attributes {
                if pool.utf8(attribute.name_index)? == ATTR_CODE {
                    if code.is_some() {
                        return Err(anyhow!("method '{}' has two Code attributes", name));
                    }
                    code = Some(parse_code(attribute.data)?);
                } else {
                    rest.push(attribute);
                }
            }

            events.push(ClassEvent::MethodStart(MethodDecl {
                access_flags,
                name,
                descriptor,
                attributes: rest,
            }));
            if let Some(code) = code {
                events.push(ClassEvent::Code(code));
            }
            events.push(ClassEvent::MethodEnd);
        }

        let class_attributes = self.parse_attributes()?;
        events.push(ClassEvent::End(class_attributes));

        if !self.bytes.is_empty() {
            return Err(anyhow!("classfile has extra bytes at the end"));
        }

        Ok(ParsedClass { pool, events })
    }

    fn parse_attributes(&mut self) -> Result<Vec<AttributeEntry>> {
        let count = self.bytes.try_get_u16()?;
        let mut attributes = Vec::with_capacity(count.into());

        for _ in 0..count {
            let name_index = self.bytes.try_get_u16()?;
            let length = self.bytes.try_get_u32()?;
            let data = try_split(&mut self.bytes, length as usize)?;

            attributes.push(AttributeEntry { name_index, data });
        }

        Ok(attributes)
    }
}

fn parse_code(mut data: Bytes) -> Result<Code> {
    let max_stack = data.try_get_u16()?;
    let max_locals = data.try_get_u16()?;

    let code_length = data.try_get_u32()?;
    let code = try_split(&mut data, code_length as usize)?;

    let exception_count = data.try_get_u16()?;
    let mut exception_table = Vec::with_capacity(exception_count.into());
    for _ in 0..exception_count {
        exception_table.push(ExceptionTableEntry {
            start_pc: data.try_get_u16()?,
            end_pc: data.try_get_u16()?,
            handler_pc: data.try_get_u16()?,
            catch_type: data.try_get_u16()?,
        });
    }

    let attribute_count = data.try_get_u16()?;
    let mut attributes = Vec::with_capacity(attribute_count.into());
    for _ in 0..attribute_count {
        let name_index = data.try_get_u16()?;
        let length = data.try_get_u32()?;
        attributes.push(AttributeEntry {
            name_index,
            data: try_split(&mut data, length as usize)?,
        });
    }

    if !data.is_empty() {
        return Err(anyhow!("Code attribute has extra bytes at the end"));
    }

    Ok(Code {
        max_stack,
        max_locals,
        insns: Vec::new(),
        raw: Some(RawBody {
            code,
            exception_table,
            attributes,
        }),
    })
}
