//! Metadata the collector stage snapshots while a class streams past.

use std::hash::{Hash, Hasher};

use crate::structs::bitflag::FieldAccessFlags;

/// One declared field of a class under observation.
///
/// Identity is (name, descriptor) only; access flags are carried along but do
/// not distinguish two records.
#[derive(Debug, Clone)]
pub struct FieldRecord {
    pub access_flags: FieldAccessFlags,
    pub name: String,
    pub descriptor: String,
}

impl PartialEq for FieldRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.descriptor == other.descriptor
    }
}

impl Eq for FieldRecord {}

impl Hash for FieldRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.descriptor.hash(state);
    }
}

/// Snapshot of one class: its name plus an insertion-ordered set of the
/// fields it declares. Populated by the collector stage, handed back to the
/// driver after the pass so later migration steps can query the layout.
#[derive(Debug, Clone, Default)]
pub struct ClassRecord {
    pub class_name: String,
    fields: Vec<FieldRecord>,
}

impl ClassRecord {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: Vec::new(),
        }
    }

    /// Inserts a field record, preserving insertion order. Returns false and
    /// leaves the set untouched when a record with the same identity is
    /// already present.
    pub fn add_field(&mut self, field: FieldRecord) -> bool {
        if self.fields.contains(&field) {
            return false;
        }

        self.fields.push(field);
        true
    }

    pub fn has_field(&self, name: &str, descriptor: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.name == name && f.descriptor == descriptor)
    }

    pub fn fields(&self) -> &[FieldRecord] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, descriptor: &str, flags: FieldAccessFlags) -> FieldRecord {
        FieldRecord {
            access_flags: flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        }
    }

    #[test]
    fn identity_ignores_access_flags() {
        let a = record("x", "I", FieldAccessFlags::PUBLIC);
        let b = record("x", "I", FieldAccessFlags::PRIVATE | FieldAccessFlags::STATIC);

        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_identities_are_rejected() {
        let mut class = ClassRecord::new("Foo");

        assert!(class.add_field(record("x", "I", FieldAccessFlags::PUBLIC)));
        assert!(!class.add_field(record("x", "I", FieldAccessFlags::PRIVATE)));
        assert!(class.add_field(record("x", "J", FieldAccessFlags::PUBLIC)));

        assert_eq!(class.fields().len(), 2);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut class = ClassRecord::new("Foo");
        class.add_field(record("b", "I", FieldAccessFlags::PUBLIC));
        class.add_field(record("a", "I", FieldAccessFlags::PUBLIC));

        let names: Vec<&str> = class.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn has_field_matches_on_name_and_descriptor() {
        let mut class = ClassRecord::new("Foo");
        class.add_field(record("x", "I", FieldAccessFlags::PUBLIC));

        assert!(class.has_field("x", "I"));
        assert!(!class.has_field("x", "J"));
        assert!(!class.has_field("y", "I"));
    }
}
