//! Wire-format tag values.
//!
//! All multi-byte integers on the wire are big-endian. Tags are single
//! bytes whose meaning depends on the position they are read at.

// Top-level records.
pub const BEGIN_GROUP: u8 = 0x00;
pub const BEGIN_GRAPH: u8 = 0x01;
pub const CLOSE_GROUP: u8 = 0x02;

// Pool references. `POOL_NEW` introduces an entry inline; `POOL_NULL` is
// the absent value; the rest are back-references followed by a u16 index.
// The same values name the entry kind inside a new-entry body.
pub const POOL_NEW: u8 = 0x00;
pub const POOL_STRING: u8 = 0x01;
pub const POOL_ENUM: u8 = 0x02;
pub const POOL_CLASS: u8 = 0x03;
pub const POOL_METHOD: u8 = 0x04;
pub const POOL_NULL: u8 = 0x05;
pub const POOL_NODE_CLASS: u8 = 0x06;
pub const POOL_FIELD: u8 = 0x07;
pub const POOL_SIGNATURE: u8 = 0x08;

// Class entry subtypes.
pub const KLASS: u8 = 0x00;
pub const ENUM_KLASS: u8 = 0x01;

// Property values.
pub const PROPERTY_POOL: u8 = 0x00;
pub const PROPERTY_INT: u8 = 0x01;
pub const PROPERTY_LONG: u8 = 0x02;
pub const PROPERTY_DOUBLE: u8 = 0x03;
pub const PROPERTY_FLOAT: u8 = 0x04;
pub const PROPERTY_TRUE: u8 = 0x05;
pub const PROPERTY_FALSE: u8 = 0x06;
pub const PROPERTY_ARRAY: u8 = 0x07;
pub const PROPERTY_SUBGRAPH: u8 = 0x08;
