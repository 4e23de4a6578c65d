//! Splits the class's one-shot static initializer into a re-invocable
//! reinitialization method plus a thin, always-present entry point.
//!
//! The runtime only ever invokes `<clinit>` itself, once per class load. The
//! reload coordinator invokes the reinit method directly, as many times as it
//! needs, after rebinding the storage holders; the reinit method carries the
//! holder-binding prologue followed by all of the original initialization
//! logic. Every transformed class leaves this stage with exactly one reinit
//! method and exactly one `<clinit>` whose body is [call reinit, return].

use std::mem;

use tracing::debug;

use crate::classfile::code::Insn;
use crate::classfile::event::{ClassEvent, Code, MethodDecl};
use crate::constants::{CLINIT_NAME, REINIT_METHOD};
use crate::error::TransformError;
use crate::pipeline::fragment::{holder_binding, initializer_delegate};
use crate::pipeline::Stage;
use crate::structs::bitflag::MethodAccessFlags;

/// Whether a pre-existing static initializer has streamed past yet. The
/// captured declaration is consumed exactly once at end-of-class to
/// synthesize the same-signature entry point.
enum Initializer {
    NotSeen,
    Captured(MethodDecl),
    Finalized,
}

pub struct InitializerSplit {
    state: Initializer,
    class_name: String,
    /// Set between the renamed initializer's declaration and its end, so the
    /// body event in between picks up the holder-binding prologue.
    redirecting: bool,
}

impl Default for InitializerSplit {
    fn default() -> Self {
        Self {
            state: Initializer::NotSeen,
            class_name: String::new(),
            redirecting: false,
        }
    }
}

impl InitializerSplit {
    fn emit_reinit_from_scratch(&self, out: &mut Vec<ClassEvent>) {
        let mut insns = holder_binding(&self.class_name);
        insns.push(Insn::Return);

        out.push(ClassEvent::MethodStart(MethodDecl {
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            name: REINIT_METHOD.to_string(),
            descriptor: "()V".to_string(),
            attributes: Vec::new(),
        }));
        out.push(ClassEvent::Code(Code {
            insns,
            ..Code::default()
        }));
        out.push(ClassEvent::MethodEnd);
    }

    fn emit_delegate(&self, decl: &MethodDecl, out: &mut Vec<ClassEvent>) {
        out.push(ClassEvent::MethodStart(MethodDecl {
            access_flags: decl.access_flags | MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
            name: CLINIT_NAME.to_string(),
            descriptor: decl.descriptor.clone(),
            attributes: decl.attributes.clone(),
        }));
        out.push(ClassEvent::Code(Code {
            insns: initializer_delegate(&self.class_name, &decl.descriptor),
            ..Code::default()
        }));
        out.push(ClassEvent::MethodEnd);
    }
}

impl Stage for InitializerSplit {
    fn name(&self) -> &'static str {
        "initializer-split"
    }

    fn on_event(
        &mut self,
        event: ClassEvent,
        out: &mut Vec<ClassEvent>,
    ) -> Result<(), TransformError> {
        match event {
            ClassEvent::Header(header) => {
                self.class_name = header.name.clone();
                out.push(ClassEvent::Header(header));
            }
            ClassEvent::MethodStart(decl) => {
                if decl.name == REINIT_METHOD {
                    return Err(TransformError::ReservedMemberCollision {
                        class: self.class_name.clone(),
                        member: decl.name,
                    });
                }

                if decl.name == CLINIT_NAME {
                    if matches!(self.state, Initializer::Captured(_)) {
                        return Err(TransformError::ClassFileFormat {
                            class: self.class_name.clone(),
                            reason: "two static initializers".to_string(),
                        });
                    }

                    debug!("redirecting static initializer of '{}'", self.class_name);

                    let renamed = MethodDecl {
                        name: REINIT_METHOD.to_string(),
                        ..decl.clone()
                    };
                    self.state = Initializer::Captured(decl);
                    self.redirecting = true;
                    out.push(ClassEvent::MethodStart(renamed));
                } else {
                    out.push(ClassEvent::MethodStart(decl));
                }
            }
            ClassEvent::Code(mut code) => {
                if self.redirecting {
                    let mut insns = holder_binding(&self.class_name);
                    insns.append(&mut code.insns);
                    code.insns = insns;
                }
                out.push(ClassEvent::Code(code));
            }
            ClassEvent::MethodEnd => {
                self.redirecting = false;
                out.push(ClassEvent::MethodEnd);
            }
            ClassEvent::End(attributes) => {
                match mem::replace(&mut self.state, Initializer::Finalized) {
                    Initializer::Captured(decl) => {
                        self.emit_delegate(&decl, out);
                    }
                    Initializer::NotSeen => {
                        debug!("'{}' had no static initializer, synthesizing", self.class_name);

                        self.emit_reinit_from_scratch(out);
                        self.emit_delegate(
                            &MethodDecl {
                                access_flags: MethodAccessFlags::PUBLIC
                                    | MethodAccessFlags::STATIC,
                                name: CLINIT_NAME.to_string(),
                                descriptor: "()V".to_string(),
                                attributes: Vec::new(),
                            },
                            out,
                        );
                    }
                    Initializer::Finalized => {
                        return Err(TransformError::ClassFileFormat {
                            class: self.class_name.clone(),
                            reason: "two class end events".to_string(),
                        });
                    }
                }

                out.push(ClassEvent::End(attributes));
            }
            other => out.push(other),
        }

        Ok(())
    }
}
