//! Event-level behaviour of the stage chain, no serialization involved.

mod common;

use rekindle::classfile::code::{Insn, MemberRef};
use rekindle::classfile::event::ClassEvent;
use rekindle::constants::{
    FIELDS_HOLDER_DESCRIPTOR, INSTANCE_HOLDER_FIELD, REINIT_METHOD, RELOAD_REF_FIELD,
    STATIC_HOLDER_FIELD,
};
use rekindle::error::TransformError;
use rekindle::pipeline::collect::FieldCollector;
use rekindle::pipeline::{run_stage, transform_events};
use rekindle::structs::bitflag::{FieldAccessFlags, MethodAccessFlags};
use rekindle::structs::record::ClassRecord;

fn field_names(events: &[ClassEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| event.as_field().map(|f| f.name.as_str()))
        .collect()
}

fn method_names(events: &[ClassEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| event.as_method_start().map(|m| m.name.as_str()))
        .collect()
}

#[test]
fn collector_observes_without_rewriting() {
    let events = vec![
        common::class_header("Foo"),
        common::field("x", "I", FieldAccessFlags::STATIC),
        common::field("y", "J", FieldAccessFlags::PUBLIC),
        common::end(),
    ];

    let mut record = ClassRecord::default();
    let out = run_stage(&mut FieldCollector::new(&mut record), events).unwrap();

    assert_eq!(out.len(), 4);
    assert_eq!(record.class_name, "Foo");
    assert!(record.has_field("x", "I"));
    assert!(record.has_field("y", "J"));
    assert!(!record.has_field("y", "I"));
}

#[test]
fn classes_gain_all_three_reserved_fields() {
    let events = vec![
        common::class_header("Foo"),
        common::field("x", "I", FieldAccessFlags::STATIC),
        common::end(),
    ];

    let mut record = ClassRecord::default();
    let out = transform_events(events, &mut record).unwrap();

    let names = field_names(&out);
    assert!(names.contains(&STATIC_HOLDER_FIELD));
    assert!(names.contains(&INSTANCE_HOLDER_FIELD));
    assert!(names.contains(&RELOAD_REF_FIELD));
    assert!(names.contains(&"x"));

    // the record only ever holds user-declared fields
    assert!(!record.has_field(STATIC_HOLDER_FIELD, FIELDS_HOLDER_DESCRIPTOR));
}

#[test]
fn interfaces_do_not_gain_an_instance_holder() {
    let events = vec![common::interface_header("Bar"), common::end()];

    let mut record = ClassRecord::default();
    let out = transform_events(events, &mut record).unwrap();

    let names = field_names(&out);
    assert!(names.contains(&STATIC_HOLDER_FIELD));
    assert!(names.contains(&RELOAD_REF_FIELD));
    assert!(!names.contains(&INSTANCE_HOLDER_FIELD));
}

#[test]
fn holder_fields_have_the_right_shape() {
    let events = vec![common::class_header("Foo"), common::end()];

    let mut record = ClassRecord::default();
    let out = transform_events(events, &mut record).unwrap();

    let static_holder = out
        .iter()
        .find_map(|e| e.as_field().filter(|f| f.name == STATIC_HOLDER_FIELD))
        .unwrap();
    assert!(static_holder.access_flags.contains(FieldAccessFlags::STATIC));
    assert!(static_holder.access_flags.contains(FieldAccessFlags::PUBLIC));
    assert_eq!(static_holder.descriptor, FIELDS_HOLDER_DESCRIPTOR);

    let instance_holder = out
        .iter()
        .find_map(|e| e.as_field().filter(|f| f.name == INSTANCE_HOLDER_FIELD))
        .unwrap();
    assert!(!instance_holder.access_flags.contains(FieldAccessFlags::STATIC));
}

#[test]
fn existing_initializer_is_redirected() {
    let set_x = vec![
        Insn::IConst(1),
        Insn::PutStatic(MemberRef::new("Foo", "x", "I")),
        Insn::Return,
    ];

    let mut events = vec![
        common::class_header("Foo"),
        common::field("x", "I", FieldAccessFlags::STATIC),
    ];
    events.extend(common::static_initializer(set_x.clone()));
    events.push(common::end());

    let mut record = ClassRecord::default();
    let out = transform_events(events, &mut record).unwrap();

    let names = method_names(&out);
    assert_eq!(names, vec![REINIT_METHOD, "<clinit>"]);

    // the reinit body is the holder prologue followed by the original insns
    let reinit_code = out
        .iter()
        .skip_while(|e| !matches!(e.as_method_start(), Some(m) if m.name == REINIT_METHOD))
        .find_map(|e| e.as_code())
        .unwrap();
    assert_eq!(reinit_code.insns.len(), 4 + set_x.len());
    assert!(reinit_code.insns.ends_with(&set_x));
    assert!(matches!(reinit_code.insns[0], Insn::New(_)));

    // the new entry point only delegates
    let clinit_code = out
        .iter()
        .skip_while(|e| !matches!(e.as_method_start(), Some(m) if m.name == "<clinit>"))
        .find_map(|e| e.as_code())
        .unwrap();
    assert_eq!(
        clinit_code.insns,
        vec![
            Insn::InvokeStatic(MemberRef::new("Foo", REINIT_METHOD, "()V")),
            Insn::Return,
        ]
    );
}

#[test]
fn missing_initializer_is_synthesized() {
    let events = vec![common::class_header("Foo"), common::end()];

    let mut record = ClassRecord::default();
    let out = transform_events(events, &mut record).unwrap();

    let names = method_names(&out);
    assert_eq!(names, vec![REINIT_METHOD, "<clinit>"]);

    let reinit = out
        .iter()
        .find_map(|e| e.as_method_start().filter(|m| m.name == REINIT_METHOD))
        .unwrap();
    assert!(reinit.access_flags.contains(MethodAccessFlags::PUBLIC));
    assert!(reinit.access_flags.contains(MethodAccessFlags::STATIC));
    assert_eq!(reinit.descriptor, "()V");

    let reinit_code = out
        .iter()
        .skip_while(|e| !matches!(e.as_method_start(), Some(m) if m.name == REINIT_METHOD))
        .find_map(|e| e.as_code())
        .unwrap();
    assert!(matches!(reinit_code.insns.last(), Some(Insn::Return)));
    assert_eq!(reinit_code.insns.len(), 5); // prologue + return
}

#[test]
fn other_methods_pass_through_untouched() {
    let greet = vec![Insn::Return];

    let mut events = vec![common::class_header("Foo")];
    events.extend(common::method(
        "greet",
        "()V",
        MethodAccessFlags::PUBLIC,
        greet.clone(),
    ));
    events.push(common::end());

    let mut record = ClassRecord::default();
    let out = transform_events(events, &mut record).unwrap();

    let greet_code = out
        .iter()
        .skip_while(|e| !matches!(e.as_method_start(), Some(m) if m.name == "greet"))
        .find_map(|e| e.as_code())
        .unwrap();
    assert_eq!(greet_code.insns, greet);
}

#[test]
fn reserved_field_name_is_a_collision() {
    let events = vec![
        common::class_header("Foo"),
        common::field(STATIC_HOLDER_FIELD, "I", FieldAccessFlags::STATIC),
        common::end(),
    ];

    let mut record = ClassRecord::default();
    let err = transform_events(events, &mut record).unwrap_err();

    match err {
        TransformError::ReservedMemberCollision { class, member } => {
            assert_eq!(class, "Foo");
            assert_eq!(member, STATIC_HOLDER_FIELD);
        }
        other => panic!("expected a collision, got {:?}", other),
    }
}

#[test]
fn reserved_method_name_is_a_collision() {
    let mut events = vec![common::class_header("Foo")];
    events.extend(common::method(
        REINIT_METHOD,
        "()V",
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
        vec![Insn::Return],
    ));
    events.push(common::end());

    let mut record = ClassRecord::default();
    let err = transform_events(events, &mut record).unwrap_err();

    assert!(matches!(
        err,
        TransformError::ReservedMemberCollision { member, .. } if member == REINIT_METHOD
    ));
}

#[test]
fn duplicate_initializers_fail_fast() {
    let mut events = vec![common::class_header("Foo")];
    events.extend(common::static_initializer(vec![Insn::Return]));
    events.extend(common::static_initializer(vec![Insn::Return]));
    events.push(common::end());

    let mut record = ClassRecord::default();
    let err = transform_events(events, &mut record).unwrap_err();

    assert!(matches!(err, TransformError::ClassFileFormat { .. }));
}
