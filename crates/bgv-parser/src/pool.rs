//! Constant pool: the index-addressed arena of interned stream objects.
//!
//! Producers send each string, class, method, field, signature, enum value
//! and node-class descriptor once, under an index they choose, and refer to
//! it by that index afterwards. [`ConstantPool`] is a plain growable
//! `Vec<Option<PoolEntry>>`; slots the producer skipped hold `None` and
//! resolve as absent.
//!
//! Entries embed the entries they were built from as shared immutable
//! values, so an entry keeps its meaning even if the producer later
//! installs something else at an index it used.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use tracing::trace;

use crate::error::{ParseError, Result, TagContext};
use crate::format::*;
use crate::reader::ChunkedReader;

/// The kinds of pool entry, plus `Any` for positions that accept every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    String,
    EnumClass,
    EnumValue,
    Class,
    Method,
    Field,
    Signature,
    NodeClass,
    Any,
}

impl PoolKind {
    /// Returns `true` if an entry of kind `found` may stand where `self`
    /// is expected. Enum classes are classes.
    pub fn accepts(self, found: PoolKind) -> bool {
        match self {
            PoolKind::Any => true,
            PoolKind::Class => matches!(found, PoolKind::Class | PoolKind::EnumClass),
            expected => expected == found,
        }
    }

    /// The kind announced by a back-reference tag, if the tag is one.
    fn from_reference_tag(tag: u8) -> Option<PoolKind> {
        match tag {
            POOL_STRING => Some(PoolKind::String),
            POOL_ENUM => Some(PoolKind::EnumValue),
            POOL_CLASS => Some(PoolKind::Class),
            POOL_METHOD => Some(PoolKind::Method),
            POOL_NODE_CLASS => Some(PoolKind::NodeClass),
            POOL_FIELD => Some(PoolKind::Field),
            POOL_SIGNATURE => Some(PoolKind::Signature),
            _ => None,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PoolKind::String => "string",
            PoolKind::EnumClass => "enum class",
            PoolKind::EnumValue => "enum value",
            PoolKind::Class => "class",
            PoolKind::Method => "method",
            PoolKind::Field => "field",
            PoolKind::Signature => "signature",
            PoolKind::NodeClass => "node class",
            PoolKind::Any => "any",
        };
        f.write_str(name)
    }
}

/// Rendering length for `{p#NAME/l|m|s}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Length {
    Short,
    Medium,
    #[default]
    Long,
}

fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

// ---------------------------------------------------------------------------
// Entry payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Klass {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumKlass {
    pub name: String,
    /// Constant names by ordinal. The producer may send null names.
    pub values: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub class: Arc<EnumKlass>,
    pub ordinal: i32,
}

impl EnumValue {
    /// The constant's name, or `Class#ordinal` when the class does not
    /// name it.
    pub fn name(&self) -> String {
        usize::try_from(self.ordinal)
            .ok()
            .and_then(|i| self.class.values.get(i))
            .and_then(|v| v.clone())
            .unwrap_or_else(|| format!("{}#{}", simple_name(&self.class.name), self.ordinal))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub arguments: Vec<String>,
    pub return_type: String,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.arguments.join(", "), self.return_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Declaring class name.
    pub holder: Option<String>,
    pub name: String,
    pub signature: Option<Arc<Signature>>,
    pub access_flags: i32,
    pub bytecodes: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub holder: Option<String>,
    pub name: String,
    pub type_name: String,
    pub access_flags: i32,
}

/// Input port of a node class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedPort {
    pub is_list: bool,
    pub name: String,
    pub element_type: Option<EnumValue>,
}

/// Successor port of a node class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub is_list: bool,
    pub name: String,
}

/// Schema for decoding the edges of every node of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeClass {
    pub class_name: String,
    pub name_template: String,
    pub inputs: Vec<TypedPort>,
    pub successors: Vec<Port>,
}

/// One interned pool object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    String(Arc<str>),
    EnumClass(Arc<EnumKlass>),
    EnumValue(EnumValue),
    Class(Arc<Klass>),
    Method(Arc<Method>),
    Field(Arc<Field>),
    Signature(Arc<Signature>),
    NodeClass(Arc<NodeClass>),
}

impl PoolEntry {
    pub fn kind(&self) -> PoolKind {
        match self {
            PoolEntry::String(_) => PoolKind::String,
            PoolEntry::EnumClass(_) => PoolKind::EnumClass,
            PoolEntry::EnumValue(_) => PoolKind::EnumValue,
            PoolEntry::Class(_) => PoolKind::Class,
            PoolEntry::Method(_) => PoolKind::Method,
            PoolEntry::Field(_) => PoolKind::Field,
            PoolEntry::Signature(_) => PoolKind::Signature,
            PoolEntry::NodeClass(_) => PoolKind::NodeClass,
        }
    }

    /// Display text at the given length.
    pub fn render(&self, length: Length) -> String {
        match self {
            PoolEntry::String(s) => s.to_string(),
            PoolEntry::Class(k) => render_class_name(&k.name, length),
            PoolEntry::EnumClass(k) => render_class_name(&k.name, length),
            PoolEntry::EnumValue(v) => v.name(),
            PoolEntry::Method(m) => {
                let holder = m.holder.as_deref();
                match length {
                    Length::Long => {
                        let args = m
                            .signature
                            .as_ref()
                            .map(|s| s.arguments.join(", "))
                            .unwrap_or_default();
                        match holder {
                            Some(h) => format!("{}.{}({})", h, m.name, args),
                            None => format!("{}({})", m.name, args),
                        }
                    }
                    Length::Medium => match holder {
                        Some(h) => format!("{}.{}", simple_name(h), m.name),
                        None => m.name.clone(),
                    },
                    Length::Short => m.name.clone(),
                }
            }
            PoolEntry::Field(field) => match (length, field.holder.as_deref()) {
                (Length::Long, Some(h)) => format!("{}.{}", h, field.name),
                (Length::Medium, Some(h)) => format!("{}.{}", simple_name(h), field.name),
                _ => field.name.clone(),
            },
            PoolEntry::Signature(s) => s.to_string(),
            PoolEntry::NodeClass(nc) => render_class_name(&nc.class_name, length),
        }
    }

    /// The class name of a plain or enum class entry.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            PoolEntry::Class(k) => Some(&k.name),
            PoolEntry::EnumClass(k) => Some(&k.name),
            _ => None,
        }
    }
}

fn render_class_name(name: &str, length: Length) -> String {
    match length {
        Length::Long | Length::Medium => name.to_string(),
        Length::Short => simple_name(name).to_string(),
    }
}

impl fmt::Display for PoolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(Length::Long))
    }
}

// ---------------------------------------------------------------------------
// The pool
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Option<PoolEntry>>,
}

fn mismatch(expected: PoolKind, found: &PoolEntry) -> ParseError {
    ParseError::PoolKindMismatch {
        expected,
        found: found.kind(),
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        ConstantPool::default()
    }

    /// Number of slots, including absent placeholders.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&PoolEntry> {
        self.entries.get(index as usize).and_then(Option::as_ref)
    }

    /// Stores `entry` at `index`, padding any gap with absent slots.
    pub fn install(&mut self, index: u16, entry: PoolEntry) {
        let index = index as usize;
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some(entry);
    }

    /// Reads one pool reference and returns the entry it denotes.
    pub fn resolve<R: Read>(
        &mut self,
        reader: &mut ChunkedReader<R>,
        expected: PoolKind,
    ) -> Result<Option<PoolEntry>> {
        let tag = reader.read_u8()?;
        let entry = match tag {
            POOL_NULL => return Ok(None),
            POOL_NEW => self.read_entry(reader)?,
            tag => {
                let announced =
                    PoolKind::from_reference_tag(tag).ok_or(ParseError::UnknownTag {
                        context: TagContext::PoolReference,
                        tag,
                    })?;
                let tag_fits = expected.accepts(announced)
                    || (expected == PoolKind::EnumClass && announced == PoolKind::Class);
                if !tag_fits {
                    return Err(ParseError::PoolKindMismatch {
                        expected,
                        found: announced,
                    });
                }
                let index = reader.read_u16()?;
                if index as usize >= self.entries.len() {
                    return Err(ParseError::InvalidPoolIndex {
                        index,
                        len: self.entries.len(),
                    });
                }
                match &self.entries[index as usize] {
                    Some(entry) => entry.clone(),
                    None => return Ok(None),
                }
            }
        };
        if !expected.accepts(entry.kind()) {
            return Err(mismatch(expected, &entry));
        }
        Ok(Some(entry))
    }

    /// Reads a new-entry body (index, kind, payload) and installs it.
    fn read_entry<R: Read>(&mut self, reader: &mut ChunkedReader<R>) -> Result<PoolEntry> {
        let index = reader.read_u16()?;
        let kind = reader.read_u8()?;
        let entry = match kind {
            POOL_STRING => {
                let s = reader.read_string()?.unwrap_or_default();
                PoolEntry::String(Arc::from(s))
            }
            POOL_CLASS => {
                let name = self.resolve_string(reader)?.unwrap_or_default();
                match reader.read_u8()? {
                    KLASS => PoolEntry::Class(Arc::new(Klass { name })),
                    ENUM_KLASS => {
                        let count = reader.read_i32()?;
                        let mut values = Vec::new();
                        for _ in 0..count {
                            values.push(self.resolve_string(reader)?);
                        }
                        PoolEntry::EnumClass(Arc::new(EnumKlass { name, values }))
                    }
                    tag => {
                        return Err(ParseError::UnknownTag {
                            context: TagContext::ClassSubtype,
                            tag,
                        })
                    }
                }
            }
            POOL_ENUM => {
                let class = match self.resolve(reader, PoolKind::EnumClass)? {
                    Some(PoolEntry::EnumClass(class)) => class,
                    Some(other) => return Err(mismatch(PoolKind::EnumClass, &other)),
                    None => Arc::new(EnumKlass {
                        name: String::new(),
                        values: Vec::new(),
                    }),
                };
                let ordinal = reader.read_i32()?;
                PoolEntry::EnumValue(EnumValue { class, ordinal })
            }
            POOL_METHOD => {
                let holder = self.resolve_class_name(reader)?;
                let name = self.resolve_string(reader)?.unwrap_or_default();
                let signature = self.resolve_signature(reader)?;
                let access_flags = reader.read_i32()?;
                let bytecodes = reader.read_bytes()?;
                PoolEntry::Method(Arc::new(Method {
                    holder,
                    name,
                    signature,
                    access_flags,
                    bytecodes,
                }))
            }
            POOL_FIELD => {
                let holder = self.resolve_class_name(reader)?;
                let name = self.resolve_string(reader)?.unwrap_or_default();
                let type_name = self.resolve_string(reader)?.unwrap_or_default();
                let access_flags = reader.read_i32()?;
                PoolEntry::Field(Arc::new(Field {
                    holder,
                    name,
                    type_name,
                    access_flags,
                }))
            }
            POOL_SIGNATURE => {
                let count = reader.read_u16()?;
                let mut arguments = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    arguments.push(self.resolve_string(reader)?.unwrap_or_default());
                }
                let return_type = self.resolve_string(reader)?.unwrap_or_default();
                PoolEntry::Signature(Arc::new(Signature {
                    arguments,
                    return_type,
                }))
            }
            POOL_NODE_CLASS => PoolEntry::NodeClass(Arc::new(self.read_node_class(reader)?)),
            tag => {
                return Err(ParseError::UnknownTag {
                    context: TagContext::PoolEntryKind,
                    tag,
                })
            }
        };
        trace!(index, kind = %entry.kind(), "installed pool entry");
        self.install(index, entry.clone());
        Ok(entry)
    }

    fn read_node_class<R: Read>(&mut self, reader: &mut ChunkedReader<R>) -> Result<NodeClass> {
        let class_name = self.resolve_string(reader)?.unwrap_or_default();
        let name_template = self.resolve_string(reader)?.unwrap_or_default();

        let input_count = reader.read_u16()?;
        let mut inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let is_list = reader.read_u8()? != 0;
            let name = self.resolve_string(reader)?.unwrap_or_default();
            let element_type = match self.resolve(reader, PoolKind::EnumValue)? {
                Some(PoolEntry::EnumValue(value)) => Some(value),
                Some(other) => return Err(mismatch(PoolKind::EnumValue, &other)),
                None => None,
            };
            inputs.push(TypedPort {
                is_list,
                name,
                element_type,
            });
        }

        let successor_count = reader.read_u16()?;
        let mut successors = Vec::with_capacity(successor_count as usize);
        for _ in 0..successor_count {
            let is_list = reader.read_u8()? != 0;
            let name = self.resolve_string(reader)?.unwrap_or_default();
            successors.push(Port { is_list, name });
        }

        Ok(NodeClass {
            class_name,
            name_template,
            inputs,
            successors,
        })
    }

    // -----------------------------------------------------------------------
    // Typed helpers
    // -----------------------------------------------------------------------

    pub fn resolve_string<R: Read>(
        &mut self,
        reader: &mut ChunkedReader<R>,
    ) -> Result<Option<String>> {
        match self.resolve(reader, PoolKind::String)? {
            Some(PoolEntry::String(s)) => Ok(Some(s.to_string())),
            Some(other) => Err(mismatch(PoolKind::String, &other)),
            None => Ok(None),
        }
    }

    /// Resolves a plain or enum class reference to its name.
    pub fn resolve_class_name<R: Read>(
        &mut self,
        reader: &mut ChunkedReader<R>,
    ) -> Result<Option<String>> {
        match self.resolve(reader, PoolKind::Class)? {
            Some(entry) => match entry.class_name() {
                Some(name) => Ok(Some(name.to_string())),
                None => Err(mismatch(PoolKind::Class, &entry)),
            },
            None => Ok(None),
        }
    }

    pub fn resolve_method<R: Read>(
        &mut self,
        reader: &mut ChunkedReader<R>,
    ) -> Result<Option<Arc<Method>>> {
        match self.resolve(reader, PoolKind::Method)? {
            Some(PoolEntry::Method(m)) => Ok(Some(m)),
            Some(other) => Err(mismatch(PoolKind::Method, &other)),
            None => Ok(None),
        }
    }

    pub fn resolve_signature<R: Read>(
        &mut self,
        reader: &mut ChunkedReader<R>,
    ) -> Result<Option<Arc<Signature>>> {
        match self.resolve(reader, PoolKind::Signature)? {
            Some(PoolEntry::Signature(s)) => Ok(Some(s)),
            Some(other) => Err(mismatch(PoolKind::Signature, &other)),
            None => Ok(None),
        }
    }

    pub fn resolve_node_class<R: Read>(
        &mut self,
        reader: &mut ChunkedReader<R>,
    ) -> Result<Option<Arc<NodeClass>>> {
        match self.resolve(reader, PoolKind::NodeClass)? {
            Some(PoolEntry::NodeClass(nc)) => Ok(Some(nc)),
            Some(other) => Err(mismatch(PoolKind::NodeClass, &other)),
            None => Ok(None),
        }
    }
}
