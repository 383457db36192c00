//! Discovers top-level function signatures for lambda type inference.

use crate::facts::{FuncSignature, FuncType};
use crate::parse::node_text;
use crate::pass::{Discovery, Pass, PassCapabilities};
use smol_str::SmolStr;
use tree_sitter::Node;

/// Collects function signatures into [`crate::Facts::signatures`].
#[derive(Debug, Default)]
pub struct SignaturesPass;

impl Pass for SignaturesPass {
    fn capabilities(&self) -> PassCapabilities {
        PassCapabilities::new("signatures").discover()
    }

    fn discover(&self, cx: &mut Discovery<'_, '_>) {
        let mut cursor = cx.root.walk();
        for decl in cx.root.named_children(&mut cursor) {
            if decl.kind() != "function_declaration" {
                continue;
            }
            let (Some(name), Some(params)) = (
                decl.child_by_field_name("name"),
                decl.child_by_field_name("parameters"),
            ) else {
                continue;
            };
            let signature = FuncSignature {
                params: parameter_types(params)
                    .into_iter()
                    .map(|ty| function_type(ty, cx.text))
                    .collect(),
            };
            cx.facts
                .signatures
                .insert(SmolStr::new(node_text(name, cx.text)), signature);
        }
    }
}

/// Expands a parameter list into one type node per parameter.
pub(crate) fn parameter_types<'t>(list: Node<'t>) -> Vec<Node<'t>> {
    let mut types = Vec::new();
    let mut cursor = list.walk();
    for param in list.named_children(&mut cursor) {
        if !matches!(
            param.kind(),
            "parameter_declaration" | "variadic_parameter_declaration"
        ) {
            continue;
        }
        let Some(ty) = param.child_by_field_name("type") else {
            continue;
        };
        let mut names = param.walk();
        let count = param.children_by_field_name("name", &mut names).count().max(1);
        types.extend(std::iter::repeat(ty).take(count));
    }
    types
}

/// Describes `ty` if it is a function type.
fn function_type(ty: Node<'_>, text: &str) -> Option<FuncType> {
    if ty.kind() != "function_type" {
        return None;
    }
    let params = ty
        .child_by_field_name("parameters")
        .map(|list| {
            parameter_types(list)
                .into_iter()
                .map(|t| node_text(t, text).to_string())
                .collect()
        })
        .unwrap_or_default();
    let result = ty
        .child_by_field_name("result")
        .map(|r| node_text(r, text).to_string());
    Some(FuncType { params, result })
}
