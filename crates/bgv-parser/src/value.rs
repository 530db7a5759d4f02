//! Decoded property values.
//!
//! Property blocks carry typed values on the wire. They stay typed until
//! their owner is complete, because name templates render pool objects at
//! different lengths, and a nested subgraph value has to be moved into the
//! owning node rather than flattened to text.

use bgv_model::Graph;

use crate::pool::{Length, PoolEntry};

#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// A pool object; `None` for a null reference.
    Pool(Option<PoolEntry>),
    Int(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    Bool(bool),
    /// An array, already rendered as `[a, b, c]`.
    Array(String),
    Subgraph(Box<Graph>),
}

impl PropertyValue {
    /// Display text at the given length. Only pool objects vary by length.
    pub fn render(&self, length: Length) -> String {
        match self {
            PropertyValue::Pool(Some(entry)) => entry.render(length),
            PropertyValue::Pool(None) => "null".to_string(),
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Long(v) => v.to_string(),
            PropertyValue::Double(v) => render_double(*v),
            PropertyValue::Float(v) => render_float(*v),
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Array(text) => text.clone(),
            PropertyValue::Subgraph(graph) => format!("subgraph ({} nodes)", graph.node_count()),
        }
    }
}

/// Shortest round-trip text, with the producer's spelling for non-finite values.
pub(crate) fn render_double(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "Infinity".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{:?}", v)
    }
}

pub(crate) fn render_float(v: f32) -> String {
    if v.is_finite() {
        format!("{:?}", v)
    } else {
        render_double(f64::from(v))
    }
}

/// Looks up the last value bound to `key`; later bindings shadow earlier ones.
pub fn find_property<'a>(props: &'a [(String, PropertyValue)], key: &str) -> Option<&'a PropertyValue> {
    props.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pool::Klass;

    #[test]
    fn scalars_render_plainly() {
        assert_eq!(PropertyValue::Int(-3).render(Length::Short), "-3");
        assert_eq!(PropertyValue::Long(1 << 40).render(Length::Long), "1099511627776");
        assert_eq!(PropertyValue::Double(1.0).render(Length::Long), "1.0");
        assert_eq!(PropertyValue::Float(0.5).render(Length::Long), "0.5");
        assert_eq!(PropertyValue::Bool(true).render(Length::Long), "true");
        assert_eq!(PropertyValue::Pool(None).render(Length::Long), "null");
    }

    #[test]
    fn non_finite_values_use_producer_spelling() {
        assert_eq!(PropertyValue::Double(f64::INFINITY).render(Length::Long), "Infinity");
        assert_eq!(PropertyValue::Double(f64::NEG_INFINITY).render(Length::Long), "-Infinity");
        assert_eq!(PropertyValue::Double(f64::NAN).render(Length::Long), "NaN");
        assert_eq!(PropertyValue::Float(f32::NEG_INFINITY).render(Length::Long), "-Infinity");
        assert_eq!(PropertyValue::Float(f32::NAN).render(Length::Short), "NaN");
        assert_eq!(PropertyValue::Float(0.1).render(Length::Long), "0.1");
    }

    #[test]
    fn pool_values_render_by_length() {
        let class = PropertyValue::Pool(Some(PoolEntry::Class(Arc::new(Klass {
            name: "java.util.ArrayList".into(),
        }))));
        assert_eq!(class.render(Length::Long), "java.util.ArrayList");
        assert_eq!(class.render(Length::Short), "ArrayList");
    }

    #[test]
    fn later_binding_shadows_earlier() {
        let props = vec![
            ("k".to_string(), PropertyValue::Int(1)),
            ("k".to_string(), PropertyValue::Int(2)),
        ];
        assert_eq!(find_property(&props, "k").unwrap().render(Length::Long), "2");
        assert!(find_property(&props, "missing").is_none());
    }
}
