//! The code sequences the pipeline synthesizes into transformed classes.

use crate::classfile::code::{Insn, MemberRef};
use crate::constants::{
    CTOR_NAME, FIELDS_HOLDER_CLASS, FIELDS_HOLDER_DESCRIPTOR, REINIT_METHOD, STATIC_HOLDER_FIELD,
};

/// The prologue run ahead of any reinitialization logic: allocate a fresh
/// fields holder and bind it to the class's static holder slot. The instance
/// holder is bound per object by the constructors, not here; `<clinit>` runs
/// in a static context.
pub fn holder_binding(class_name: &str) -> Vec<Insn> {
    vec![
        Insn::New(FIELDS_HOLDER_CLASS.to_string()),
        Insn::Dup,
        Insn::InvokeSpecial(MemberRef::new(FIELDS_HOLDER_CLASS, CTOR_NAME, "()V")),
        Insn::PutStatic(MemberRef::new(
            class_name,
            STATIC_HOLDER_FIELD,
            FIELDS_HOLDER_DESCRIPTOR,
        )),
    ]
}

/// The entire body of the synthesized standard initializer: call the reinit
/// method once and return.
pub fn initializer_delegate(class_name: &str, descriptor: &str) -> Vec<Insn> {
    vec![
        Insn::InvokeStatic(MemberRef::new(class_name, REINIT_METHOD, descriptor)),
        Insn::Return,
    ]
}
