#![allow(dead_code)]

use rekindle::classfile::code::Insn;
use rekindle::classfile::event::{
    ClassEvent, ClassHeader, Code, FieldDecl, MethodDecl, RawBody,
};
use rekindle::classfile::parse::{ClassFileParser, ParsedClass};
use rekindle::classfile::pool::{ConstantPool, PoolEntry};
use rekindle::classfile::write::ClassFileWriter;
use rekindle::structs::bitflag::{ClassAccessFlags, FieldAccessFlags, MethodAccessFlags};

pub fn header(name: &str, access_flags: ClassAccessFlags) -> ClassEvent {
    ClassEvent::Header(ClassHeader {
        minor_version: 0,
        major_version: 49,
        access_flags,
        name: name.to_string(),
        super_name: Some("java/lang/Object".to_string()),
        interfaces: Vec::new(),
    })
}

pub fn class_header(name: &str) -> ClassEvent {
    header(name, ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER)
}

pub fn interface_header(name: &str) -> ClassEvent {
    header(
        name,
        ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
    )
}

pub fn field(name: &str, descriptor: &str, access_flags: FieldAccessFlags) -> ClassEvent {
    ClassEvent::Field(FieldDecl {
        access_flags,
        name: name.to_string(),
        descriptor: descriptor.to_string(),
        attributes: Vec::new(),
    })
}

/// The three events of one concrete method whose body is built from `insns`.
pub fn method(
    name: &str,
    descriptor: &str,
    access_flags: MethodAccessFlags,
    insns: Vec<Insn>,
) -> Vec<ClassEvent> {
    vec![
        ClassEvent::MethodStart(MethodDecl {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            attributes: Vec::new(),
        }),
        ClassEvent::Code(Code {
            insns,
            ..Code::default()
        }),
        ClassEvent::MethodEnd,
    ]
}

pub fn static_initializer(insns: Vec<Insn>) -> Vec<ClassEvent> {
    method(
        "<clinit>",
        "()V",
        MethodAccessFlags::STATIC,
        insns,
    )
}

pub fn end() -> ClassEvent {
    ClassEvent::End(Vec::new())
}

pub fn build(events: Vec<ClassEvent>) -> Vec<u8> {
    ClassFileWriter::new(ConstantPool::new())
        .write(&events)
        .expect("test class to serialize")
}

pub fn parse(bytes: &[u8]) -> ParsedClass {
    ClassFileParser::from_bytes(bytes)
        .parse()
        .expect("test class to parse")
}

pub fn find_field<'a>(parsed: &'a ParsedClass, name: &str) -> Option<&'a FieldDecl> {
    parsed.events.iter().find_map(|event| match event {
        ClassEvent::Field(field) if field.name == name => Some(field),
        _ => None,
    })
}

pub fn find_method<'a>(parsed: &'a ParsedClass, name: &str) -> Option<&'a MethodDecl> {
    parsed.events.iter().find_map(|event| match event {
        ClassEvent::MethodStart(decl) if decl.name == name => Some(decl),
        _ => None,
    })
}

pub fn method_names(parsed: &ParsedClass) -> Vec<&str> {
    parsed
        .events
        .iter()
        .filter_map(|event| match event {
            ClassEvent::MethodStart(decl) => Some(decl.name.as_str()),
            _ => None,
        })
        .collect()
}

/// The parsed body of a named method; panics when the method is missing or
/// has no code.
pub fn code_of<'a>(parsed: &'a ParsedClass, name: &str) -> (&'a Code, &'a RawBody) {
    let mut events = parsed.events.iter();

    while let Some(event) = events.next() {
        if matches!(event, ClassEvent::MethodStart(decl) if decl.name == name) {
            return match events.next() {
                Some(ClassEvent::Code(code)) => {
                    (code, code.raw.as_ref().expect("parsed body to be raw"))
                }
                other => panic!("method '{}' has no body, next event {:?}", name, other),
            };
        }
    }

    panic!("method '{}' not found", name);
}

pub fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([bytes[offset], bytes[offset + 1]])
}

fn name_and_type(pool: &ConstantPool, index: u16) -> (String, String) {
    match pool.get(index).expect("name and type entry") {
        PoolEntry::NameAndType { name, descriptor } => (
            pool.utf8(*name).unwrap().to_string(),
            pool.utf8(*descriptor).unwrap().to_string(),
        ),
        other => panic!("entry {} was not a name and type, got {:?}", index, other),
    }
}

/// Resolves a field ref to (owner, name, descriptor).
pub fn field_ref(pool: &ConstantPool, index: u16) -> (String, String, String) {
    match pool.get(index).expect("field ref entry") {
        PoolEntry::FieldRef {
            class,
            name_and_type: nat,
        } => {
            let owner = pool.class_name(*class).unwrap().to_string();
            let (name, descriptor) = name_and_type(pool, *nat);
            (owner, name, descriptor)
        }
        other => panic!("entry {} was not a field ref, got {:?}", index, other),
    }
}

/// Resolves a method ref to (owner, name, descriptor).
pub fn method_ref(pool: &ConstantPool, index: u16) -> (String, String, String) {
    match pool.get(index).expect("method ref entry") {
        PoolEntry::MethodRef {
            class,
            name_and_type: nat,
        } => {
            let owner = pool.class_name(*class).unwrap().to_string();
            let (name, descriptor) = name_and_type(pool, *nat);
            (owner, name, descriptor)
        }
        other => panic!("entry {} was not a method ref, got {:?}", index, other),
    }
}
