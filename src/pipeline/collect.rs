//! Collects the basic info of a class as it streams past.

use tracing::{debug, trace};

use crate::classfile::event::ClassEvent;
use crate::constants::RESERVED_MEMBERS;
use crate::error::TransformError;
use crate::pipeline::Stage;
use crate::structs::record::{ClassRecord, FieldRecord};

/// Populates the supplied [`ClassRecord`] from the field events of one class
/// and forwards every event unchanged.
///
/// This stage sits first in the chain, upstream of the injection stages, so
/// it only ever observes user-declared members. That makes it the natural
/// place to enforce the reserved-name policy: a user field carrying one of
/// our synthetic names aborts the transform instead of silently ending up
/// duplicated later.
pub struct FieldCollector<'a> {
    record: &'a mut ClassRecord,
}

impl<'a> FieldCollector<'a> {
    pub fn new(record: &'a mut ClassRecord) -> Self {
        Self { record }
    }
}

impl Stage for FieldCollector<'_> {
    fn name(&self) -> &'static str {
        "field-collector"
    }

    fn on_event(
        &mut self,
        event: ClassEvent,
        out: &mut Vec<ClassEvent>,
    ) -> Result<(), TransformError> {
        match &event {
            ClassEvent::Header(header) => {
                self.record.class_name = header.name.clone();
            }
            ClassEvent::Field(field) => {
                if RESERVED_MEMBERS.contains(field.name.as_str()) {
                    return Err(TransformError::ReservedMemberCollision {
                        class: self.record.class_name.clone(),
                        member: field.name.clone(),
                    });
                }

                let added = self.record.add_field(FieldRecord {
                    access_flags: field.access_flags,
                    name: field.name.clone(),
                    descriptor: field.descriptor.clone(),
                });

                if added {
                    trace!("recorded field {}:{}", field.name, field.descriptor);
                } else {
                    debug!(
                        "duplicate field {}:{} in '{}', keeping the first",
                        field.name, field.descriptor, self.record.class_name
                    );
                }
            }
            _ => {}
        }

        out.push(event);
        Ok(())
    }
}
