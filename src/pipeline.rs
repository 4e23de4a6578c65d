//! The structural transformation pipeline: a fixed-order chain of stages,
//! each receiving one event at a time and emitting zero or more events
//! downstream. The driver owns the event buffers; stages own nothing but the
//! state of their current pass.

pub mod clinit;
pub mod collect;
pub mod fragment;
pub mod holders;
pub mod reloader;

use tracing::debug;

use crate::classfile::event::ClassEvent;
use crate::error::TransformError;
use crate::pipeline::clinit::InitializerSplit;
use crate::pipeline::collect::FieldCollector;
use crate::pipeline::holders::StaticHolderInjection;
use crate::pipeline::reloader::ReloadReferenceInjection;
use crate::structs::record::ClassRecord;

pub trait Stage {
    fn name(&self) -> &'static str;

    /// Receives the next structural event. Everything a stage wants to keep
    /// goes through `out`; an event neither pushed nor transformed is
    /// dropped from the stream.
    fn on_event(
        &mut self,
        event: ClassEvent,
        out: &mut Vec<ClassEvent>,
    ) -> Result<(), TransformError>;
}

/// Feeds a full event buffer through one stage.
pub fn run_stage<S: Stage>(
    stage: &mut S,
    events: Vec<ClassEvent>,
) -> Result<Vec<ClassEvent>, TransformError> {
    debug!("running stage '{}' over {} events", stage.name(), events.len());

    let mut out = Vec::with_capacity(events.len() + 4);
    for event in events {
        stage.on_event(event, &mut out)?;
    }

    Ok(out)
}

/// The fixed chain: collect fields, inject storage holders, inject the
/// reload reference, split the static initializer. One pass over one class;
/// `record` is populated as a side artifact and handed back to the caller.
pub fn transform_events(
    events: Vec<ClassEvent>,
    record: &mut ClassRecord,
) -> Result<Vec<ClassEvent>, TransformError> {
    let events = run_stage(&mut FieldCollector::new(record), events)?;
    let events = run_stage(&mut StaticHolderInjection::default(), events)?;
    let events = run_stage(&mut ReloadReferenceInjection::default(), events)?;
    run_stage(&mut InitializerSplit::default(), events)
}
