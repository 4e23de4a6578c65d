//! Adds the reload controller reference to the class.

use crate::classfile::event::{ClassEvent, FieldDecl};
use crate::constants::{CLASS_RELOADER_DESCRIPTOR, RELOAD_REF_FIELD};
use crate::error::TransformError;
use crate::pipeline::Stage;
use crate::structs::bitflag::FieldAccessFlags;

/// Emits the reload reference field for every class, interface or not. The
/// reload coordinator binds a controller to this slot later; a stable,
/// discoverable field spares it reflection probing.
#[derive(Default)]
pub struct ReloadReferenceInjection;

impl Stage for ReloadReferenceInjection {
    fn name(&self) -> &'static str {
        "reload-reference-injection"
    }

    fn on_event(
        &mut self,
        event: ClassEvent,
        out: &mut Vec<ClassEvent>,
    ) -> Result<(), TransformError> {
        let is_header = matches!(&event, ClassEvent::Header(_));

        out.push(event);

        if is_header {
            out.push(ClassEvent::Field(FieldDecl {
                access_flags: FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC,
                name: RELOAD_REF_FIELD.to_string(),
                descriptor: CLASS_RELOADER_DESCRIPTOR.to_string(),
                attributes: Vec::new(),
            }));
        }

        Ok(())
    }
}
