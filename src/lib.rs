//! rekindle rewrites compiled JVM classes so that they can be reinitialized
//! and have their field storage reshaped after the process has started.
//!
//! The core is a fixed chain of stages over the structural events of one
//! class definition (header, fields, methods, end). The chain gives every
//! class indirect storage holders for its fields, a reference slot for an
//! external reload coordinator, and splits the one-shot `<clinit>` into a
//! re-invocable reinitialization method plus a thin delegating entry point.
//!
//! See [`transform::Transformer`] for the front door.

pub mod classfile;
pub mod constants;
pub mod error;
pub mod interface;
pub mod pipeline;
pub mod structs;
pub mod transform;
