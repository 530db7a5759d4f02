//! Minimal BGV stream encoder for tests.
//!
//! Pool entries are interned on first use under sequential indices and
//! back-referenced afterwards, the way a real producer does it.

#![allow(dead_code)]

use std::collections::HashMap;

use bgv_parser::format::*;

/// A node-class descriptor to encode.
pub struct ClassSpec {
    pub class_name: &'static str,
    pub template: &'static str,
    /// `(is_list, name)` per input port; element types are sent as null.
    pub inputs: Vec<(bool, &'static str)>,
    /// `(is_list, name)` per successor port.
    pub successors: Vec<(bool, &'static str)>,
}

impl ClassSpec {
    pub fn plain(class_name: &'static str) -> Self {
        ClassSpec {
            class_name,
            template: "",
            inputs: Vec::new(),
            successors: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct Stream {
    bytes: Vec<u8>,
    next_index: u16,
    interned: HashMap<String, (u8, u16)>,
}

impl Stream {
    pub fn new() -> Self {
        Stream::default()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    // Scalars.

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend(v.to_be_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.bytes.extend(v.to_be_bytes());
        self
    }

    pub fn i64(&mut self, v: i64) -> &mut Self {
        self.bytes.extend(v.to_be_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.bytes.extend(v.to_be_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.bytes.extend(v.to_be_bytes());
        self
    }

    pub fn raw_string(&mut self, s: &str) -> &mut Self {
        self.i32(s.len() as i32);
        self.bytes.extend(s.as_bytes());
        self
    }

    // Pool references.

    pub fn null(&mut self) -> &mut Self {
        self.u8(POOL_NULL)
    }

    /// Writes a back-reference if `key` was interned, otherwise opens a new
    /// entry of `kind` and returns `true` so the caller writes its payload.
    fn intern(&mut self, key: String, kind: u8) -> bool {
        if let Some(&(tag, index)) = self.interned.get(&key) {
            self.u8(tag).u16(index);
            return false;
        }
        let index = self.next_index;
        self.next_index += 1;
        self.interned.insert(key, (kind, index));
        self.u8(POOL_NEW).u16(index).u8(kind);
        true
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        if self.intern(format!("s:{}", s), POOL_STRING) {
            self.raw_string(s);
        }
        self
    }

    pub fn class(&mut self, name: &str) -> &mut Self {
        if self.intern(format!("c:{}", name), POOL_CLASS) {
            self.string(name).u8(KLASS);
        }
        self
    }

    pub fn node_class(&mut self, spec: &ClassSpec) -> &mut Self {
        if self.intern(format!("n:{}", spec.class_name), POOL_NODE_CLASS) {
            self.string(spec.class_name).string(spec.template);
            self.u16(spec.inputs.len() as u16);
            for &(is_list, name) in &spec.inputs {
                self.u8(is_list as u8).string(name).null();
            }
            self.u16(spec.successors.len() as u16);
            for &(is_list, name) in &spec.successors {
                self.u8(is_list as u8).string(name);
            }
        }
        self
    }

    pub fn method(&mut self, holder: &str, name: &str) -> &mut Self {
        if self.intern(format!("m:{}.{}", holder, name), POOL_METHOD) {
            self.class(holder).string(name);
            if self.intern("sig:()void".to_string(), POOL_SIGNATURE) {
                self.u16(0).string("void");
            }
            self.i32(0).i32(-1);
        }
        self
    }

    // Records.

    /// Opens a group with no method and no properties.
    pub fn begin_group(&mut self, name: &str) -> &mut Self {
        self.u8(BEGIN_GROUP).string(name).string(name).null().i32(-1).u16(0)
    }

    /// Writes a begin-graph tag and title; the body follows.
    pub fn begin_graph(&mut self, title: &str) -> &mut Self {
        self.u8(BEGIN_GRAPH).string(title)
    }

    pub fn close_group(&mut self) -> &mut Self {
        self.u8(CLOSE_GROUP)
    }

    /// Node header: id, class, predecessor count, and an empty property block.
    pub fn node(&mut self, id: i32, class: &ClassSpec, predecessors: u8) -> &mut Self {
        self.i32(id).node_class(class).u8(predecessors).u16(0)
    }

    /// A complete body with plain nodes and no blocks.
    pub fn plain_body(&mut self, ids: &[i32], class: &ClassSpec) -> &mut Self {
        self.i32(ids.len() as i32);
        for &id in ids {
            self.node(id, class, 0);
        }
        self.i32(0)
    }
}
