//! Node display names from node-class name templates.
//!
//! A template is literal text with placeholders:
//!
//! - `{p#NAME}`, `{p#NAME/l}`, `{p#NAME/m}`, `{p#NAME/s}`: the node's
//!   property `NAME` at long (default), medium or short length; `?` when
//!   the node has no such property.
//! - `{i#NAME}`: the source ids of the node's input edges on port `NAME`
//!   (the port itself or any element `NAME[j]` of a list port), joined
//!   with `", "`.
//!
//! Substituted text is inserted literally.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use bgv_model::Edge;

use crate::pool::Length;

fn placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{(p|i)#([a-zA-Z0-9$_]+)(/(l|m|s))?\}")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Expands `template` for one node.
///
/// `edges` are the node's own decoded edges; only input edges take part.
/// `property` renders a property of the node at the requested length.
pub fn expand_template<F>(template: &str, edges: &[Edge], property: F) -> String
where
    F: Fn(&str, Length) -> Option<String>,
{
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[2];
            if &caps[1] == "i" {
                return edges
                    .iter()
                    .filter(|e| e.is_input() && e.label_matches_port(name))
                    .map(|e| e.from.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
            }
            let length = match caps.get(4).map(|m| m.as_str()) {
                Some("s") => Length::Short,
                Some("m") => Length::Medium,
                _ => Length::Long,
            };
            property(name, length).unwrap_or_else(|| "?".to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use bgv_model::NodeId;

    use super::*;

    fn no_props(_: &str, _: Length) -> Option<String> {
        None
    }

    #[test]
    fn property_and_input_list_expand() {
        let edges = vec![
            Edge::input(NodeId(5), NodeId(9), 0, "x[0]", ""),
            Edge::input(NodeId(7), NodeId(9), 1, "x[1]", ""),
        ];
        let name = expand_template("{p#name}:{i#x}", &edges, |key, _| {
            (key == "name").then(|| "Foo".to_string())
        });
        assert_eq!(name, "Foo:5, 7");
    }

    #[test]
    fn missing_property_renders_question_mark() {
        assert_eq!(expand_template("C({p#value})", &[], no_props), "C(?)");
    }

    #[test]
    fn length_suffix_is_passed_through() {
        let name = expand_template("{p#t/s}|{p#t/m}|{p#t/l}|{p#t}", &[], |_, length| {
            Some(format!("{:?}", length))
        });
        assert_eq!(name, "Short|Medium|Long|Long");
    }

    #[test]
    fn input_match_requires_exact_port_or_list_element() {
        let edges = vec![
            Edge::input(NodeId(1), NodeId(9), 0, "value", ""),
            Edge::input(NodeId(2), NodeId(9), 1, "values[0]", ""),
            Edge::input(NodeId(3), NodeId(9), 2, "value[0]", ""),
        ];
        assert_eq!(expand_template("{i#value}", &edges, no_props), "1, 3");
    }

    #[test]
    fn successor_edges_do_not_expand() {
        let edges = vec![Edge::successor(NodeId(9), NodeId(4), 0, "next")];
        assert_eq!(expand_template("[{i#next}]", &edges, no_props), "[]");
    }

    #[test]
    fn dollar_and_backslash_are_inserted_literally() {
        let name = expand_template("{p#v}", &[], |_, _| Some(r"a$1\b${x}".to_string()));
        assert_eq!(name, r"a$1\b${x}");
    }

    #[test]
    fn text_without_placeholders_is_unchanged() {
        assert_eq!(expand_template("Start {not a placeholder}", &[], no_props), "Start {not a placeholder}");
    }
}
