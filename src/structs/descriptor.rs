//! Minimal descriptor parsing, enough to compute operand slot counts for the
//! instruction sequences the pipeline synthesizes.

use std::iter::Peekable;
use std::str::Chars;

use anyhow::{anyhow, Result};

/// <BaseType> ::= 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'V'
#[derive(Debug, PartialEq, Clone)]
pub enum BaseType {
    Boolean, // Z
    Char,    // C
    Float,   // F
    Double,  // D
    Byte,    // B
    Short,   // S
    Int,     // I
    Long,    // J
    Void,    // V
}

impl BaseType {
    pub fn slot_width(&self) -> u16 {
        match self {
            BaseType::Double | BaseType::Long => 2,
            BaseType::Void => 0,
            _ => 1,
        }
    }
}

/// <FieldType> ::= <BaseType> | 'L' <ClassName> ';' | '[' <FieldType>
#[derive(Debug, PartialEq, Clone)]
pub enum FieldType {
    Base(BaseType),
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut chars = descriptor.chars().peekable();
        let parsed = Self::parse_from_iterator(&mut chars)?;

        if chars.next().is_some() {
            return Err(anyhow!("trailing characters in descriptor '{}'", descriptor));
        }

        Ok(parsed)
    }

    fn parse_from_iterator(chars: &mut Peekable<Chars>) -> Result<Self> {
        let tag = chars
            .next()
            .ok_or_else(|| anyhow!("descriptor ended early"))?;

        Ok(match tag {
            'Z' => FieldType::Base(BaseType::Boolean),
            'C' => FieldType::Base(BaseType::Char),
            'F' => FieldType::Base(BaseType::Float),
            'D' => FieldType::Base(BaseType::Double),
            'B' => FieldType::Base(BaseType::Byte),
            'S' => FieldType::Base(BaseType::Short),
            'I' => FieldType::Base(BaseType::Int),
            'J' => FieldType::Base(BaseType::Long),
            'V' => FieldType::Base(BaseType::Void),
            'L' => {
                let mut class_name = String::new();

                loop {
                    match chars.next() {
                        Some(';') => break,
                        Some(c) => class_name.push(c),
                        None => return Err(anyhow!("unterminated object descriptor")),
                    }
                }

                FieldType::Object(class_name)
            }
            '[' => FieldType::Array(Box::new(Self::parse_from_iterator(chars)?)),
            _ => return Err(anyhow!("unknown descriptor tag '{}'", tag)),
        })
    }

    pub fn slot_width(&self) -> u16 {
        match self {
            FieldType::Base(base) => base.slot_width(),
            // references occupy one slot regardless of what they point at
            FieldType::Object(_) | FieldType::Array(_) => 1,
        }
    }
}

/// <MethodType> ::= '(' { <FieldType> } ')' <FieldType>
#[derive(Debug, PartialEq, Clone)]
pub struct MethodType {
    pub parameters: Vec<FieldType>,
    pub return_type: FieldType,
}

impl MethodType {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut chars = descriptor.chars().peekable();
        if chars.next() != Some('(') {
            return Err(anyhow!("descriptor did not start with ("));
        }

        let mut parameters = Vec::new();

        while chars.peek() != Some(&')') {
            parameters.push(FieldType::parse_from_iterator(&mut chars)?);
        }

        // Skip )
        chars.next();

        let return_type = FieldType::parse_from_iterator(&mut chars)?;

        if chars.next().is_some() {
            return Err(anyhow!("trailing characters in descriptor '{}'", descriptor));
        }

        Ok(MethodType {
            parameters,
            return_type,
        })
    }

    pub fn argument_slots(&self) -> u16 {
        self.parameters.iter().map(|p| p.slot_width()).sum()
    }

    pub fn return_slots(&self) -> u16 {
        self.return_type.slot_width()
    }
}
