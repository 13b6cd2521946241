//! Singleton collapse of parsed field trees
//!
//! A list holding exactly one child is replaced by that child, level by
//! level, so arrays only appear where a value actually varies.

use crate::hl7::Node;
use serde_json::Value;

/// Convert a parsed node into its collapsed JSON form
///
/// ```
/// use hl7stage::core::transform::collapse::collapse;
/// use hl7stage::hl7::Node;
/// use serde_json::json;
///
/// let single = Node::List(vec![Node::List(vec![Node::List(vec![Node::leaf("a")])])]);
/// assert_eq!(collapse(&single), json!("a"));
/// ```
pub fn collapse(node: &Node) -> Value {
    match node {
        Node::Leaf(value) => Value::String(value.clone()),
        Node::List(children) => match children.as_slice() {
            [] => Value::String(String::new()),
            [only] => collapse(only),
            many => Value::Array(many.iter().map(collapse).collect()),
        },
    }
}
