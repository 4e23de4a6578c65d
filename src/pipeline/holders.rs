//! Adds the storage holder fields to the class.

use crate::classfile::event::{ClassEvent, FieldDecl};
use crate::constants::{FIELDS_HOLDER_DESCRIPTOR, INSTANCE_HOLDER_FIELD, STATIC_HOLDER_FIELD};
use crate::error::TransformError;
use crate::pipeline::Stage;
use crate::structs::bitflag::FieldAccessFlags;

/// Emits the static holder field for every class and the instance holder
/// field for every non-interface class, right after the header.
///
/// Interfaces cannot declare instance fields, so the instance holder is
/// omitted there; adding it would make the class definition invalid.
#[derive(Default)]
pub struct StaticHolderInjection;

pub(crate) fn holder_field(name: &str, access_flags: FieldAccessFlags) -> FieldDecl {
    FieldDecl {
        access_flags,
        name: name.to_string(),
        descriptor: FIELDS_HOLDER_DESCRIPTOR.to_string(),
        attributes: Vec::new(),
    }
}

impl Stage for StaticHolderInjection {
    fn name(&self) -> &'static str {
        "static-holder-injection"
    }

    fn on_event(
        &mut self,
        event: ClassEvent,
        out: &mut Vec<ClassEvent>,
    ) -> Result<(), TransformError> {
        let is_interface = match &event {
            ClassEvent::Header(header) => Some(header.access_flags.is_interface()),
            _ => None,
        };

        out.push(event);

        if let Some(is_interface) = is_interface {
            out.push(ClassEvent::Field(holder_field(
                STATIC_HOLDER_FIELD,
                FieldAccessFlags::PUBLIC | FieldAccessFlags::STATIC,
            )));

            if !is_interface {
                out.push(ClassEvent::Field(holder_field(
                    INSTANCE_HOLDER_FIELD,
                    FieldAccessFlags::PUBLIC,
                )));
            }
        }

        Ok(())
    }
}
