//! The reserved vocabulary of synthetic members the pipeline introduces.
//!
//! These identifiers are a stable on-disk protocol: any tool inspecting a
//! transformed class locates the reinit entry point, the storage holders and
//! the reload reference by these exact ASCII names. Do not change them.

use std::collections::HashSet;

/// Holds the static field values of a transformed class.
pub const STATIC_HOLDER_FIELD: &str = "__holder_static__";

/// Holds the instance field values of a transformed (non-interface) class.
pub const INSTANCE_HOLDER_FIELD: &str = "__holder_instance__";

/// Bound by the reload coordinator to the per-class reload controller.
pub const RELOAD_REF_FIELD: &str = "__reload_ref__";

/// The re-invocable method carrying the original `<clinit>` logic.
pub const REINIT_METHOD: &str = "__reinit__";

/// The runtime's fire-once static initializer marker.
pub const CLINIT_NAME: &str = "<clinit>";

/// Instance constructor marker, used when binding holders.
pub const CTOR_NAME: &str = "<init>";

pub const FIELDS_HOLDER_CLASS: &str = "rekindle/runtime/FieldsHolder";
pub const FIELDS_HOLDER_DESCRIPTOR: &str = "Lrekindle/runtime/FieldsHolder;";

pub const CLASS_RELOADER_CLASS: &str = "rekindle/runtime/ClassReloader";
pub const CLASS_RELOADER_DESCRIPTOR: &str = "Lrekindle/runtime/ClassReloader;";

lazy_static::lazy_static! {
    /// Every synthetic member name the pipeline may add to a class.
    /// Read-only after startup; used to recognise and reject user-declared
    /// members that would collide with ours.
    pub static ref RESERVED_MEMBERS: HashSet<&'static str> = {
        let mut names = HashSet::new();
        names.insert(STATIC_HOLDER_FIELD);
        names.insert(INSTANCE_HOLDER_FIELD);
        names.insert(RELOAD_REF_FIELD);
        names.insert(REINIT_METHOD);
        names
    };
}
