//! Discovers sum types: sealed interfaces and their variants.
//!
//! A sum type is an interface whose only element is a nullary marker method
//! with no result. Its variants are the types with a method of that name,
//! in declaration order.

use crate::facts::Facts;
use crate::parse::node_text;
use crate::pass::{Discovery, Pass, PassCapabilities};
use smol_str::SmolStr;
use tree_sitter::Node;

/// Collects sum types into [`Facts::sum_types`].
#[derive(Debug, Default)]
pub struct SumTypesPass;

impl Pass for SumTypesPass {
    fn capabilities(&self) -> PassCapabilities {
        PassCapabilities::new("sum-types").discover()
    }

    fn discover(&self, cx: &mut Discovery<'_, '_>) {
        collect_sum_types(cx.root, cx.text, cx.facts);
    }
}

pub(crate) fn collect_sum_types(root: Node<'_>, text: &str, facts: &mut Facts) {
    let mut interfaces: Vec<(SmolStr, SmolStr)> = Vec::new();
    let mut methods: Vec<(SmolStr, SmolStr)> = Vec::new();

    let mut cursor = root.walk();
    for decl in root.named_children(&mut cursor) {
        match decl.kind() {
            "type_declaration" => {
                let mut specs = decl.walk();
                for spec in decl.named_children(&mut specs) {
                    if spec.kind() != "type_spec" {
                        continue;
                    }
                    let (Some(name), Some(ty)) =
                        (spec.child_by_field_name("name"), spec.child_by_field_name("type"))
                    else {
                        continue;
                    };
                    if let Some(marker) = marker_method(ty, text) {
                        interfaces.push((SmolStr::new(node_text(name, text)), marker));
                    }
                }
            }
            "method_declaration" => {
                let receiver = decl
                    .child_by_field_name("receiver")
                    .and_then(|r| receiver_type(r, text));
                let name = decl.child_by_field_name("name");
                let nullary = decl
                    .child_by_field_name("parameters")
                    .is_some_and(|p| p.named_child_count() == 0);
                if let (Some(receiver), Some(name), true) = (receiver, name, nullary) {
                    methods.push((SmolStr::new(node_text(name, text)), receiver));
                }
            }
            _ => {}
        }
    }

    for (interface, marker) in interfaces {
        let variants: Vec<SmolStr> = methods
            .iter()
            .filter(|(method, _)| *method == marker)
            .map(|(_, receiver)| receiver.clone())
            .collect();
        if variants.is_empty() {
            continue;
        }
        tracing::debug!(sum_type = %interface, ?variants, "discovered sum type");
        facts.add_sum_type(interface, variants);
    }
}

/// Returns the marker method name if `ty` is a single-marker interface.
fn marker_method(ty: Node<'_>, text: &str) -> Option<SmolStr> {
    if ty.kind() != "interface_type" {
        return None;
    }
    let mut cursor = ty.walk();
    let elements: Vec<Node<'_>> = ty
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    let [method] = elements.as_slice() else {
        return None;
    };
    if !matches!(method.kind(), "method_elem" | "method_spec") {
        return None;
    }
    let params = method.child_by_field_name("parameters")?;
    if params.named_child_count() != 0 || method.child_by_field_name("result").is_some() {
        return None;
    }
    Some(SmolStr::new(node_text(method.child_by_field_name("name")?, text)))
}

/// Returns the base type name of a receiver list like `(c *Circle)`.
fn receiver_type(receiver: Node<'_>, text: &str) -> Option<SmolStr> {
    let param = receiver.named_child(0)?;
    let mut ty = param.child_by_field_name("type")?;
    if ty.kind() == "pointer_type" {
        ty = ty.named_child(0)?;
    }
    (ty.kind() == "type_identifier").then(|| SmolStr::new(node_text(ty, text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_go;
    use pretty_assertions::assert_eq;

    fn discover(text: &str) -> Facts {
        let tree = parse_go(text).unwrap();
        let mut facts = Facts::default();
        collect_sum_types(tree.root_node(), text, &mut facts);
        facts
    }

    #[test]
    fn test_enum_shaped_interface() {
        let facts = discover(
            "package p\n\ntype Shape interface {\n\tisShape()\n}\n\ntype Circle struct{ r float64 }\n\ntype Empty struct{}\n\nfunc (Circle) isShape() {}\n\nfunc (*Empty) isShape() {}\n",
        );
        assert_eq!(
            facts.sum_types.get("Shape").cloned(),
            Some(vec![SmolStr::new("Circle"), SmolStr::new("Empty")])
        );
        assert_eq!(facts.variant_owner.get("Empty").map(|s| s.as_str()), Some("Shape"));
    }

    #[test]
    fn test_interface_with_result_is_not_a_sum_type() {
        let facts = discover(
            "package p\n\ntype Stringer interface {\n\tString() string\n}\n\ntype A struct{}\n\nfunc (A) String() string { return \"\" }\n",
        );
        assert!(facts.sum_types.is_empty());
    }

    #[test]
    fn test_interface_without_variants_is_ignored() {
        let facts = discover("package p\n\ntype Marker interface {\n\tmark()\n}\n");
        assert!(facts.sum_types.is_empty());
    }
}
