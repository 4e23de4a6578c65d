//! Reading and writing of the class binary format, expressed as a structural
//! event stream (header, fields, methods, end) the pipeline can rewrite.

pub mod buf;
pub mod code;
pub mod event;
pub mod parse;
pub mod pool;
pub mod write;

pub const MAGIC: u32 = 0xCAFEBABE;

/// Attribute names the writer has to understand when it splices synthesized
/// code ahead of an original method body.
pub const ATTR_CODE: &str = "Code";
pub const ATTR_STACK_MAP_TABLE: &str = "StackMapTable";
pub const ATTR_LINE_NUMBER_TABLE: &str = "LineNumberTable";
pub const ATTR_LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
pub const ATTR_LOCAL_VARIABLE_TYPE_TABLE: &str = "LocalVariableTypeTable";
