//! Expands lambdas into Go function literals.
//!
//! Missing parameter and result types are inferred from the function-typed
//! parameter of the top-level function the lambda is passed to.

use crate::facts::{Facts, FuncType};
use crate::parse::node_text;
use crate::pass::{Attached, Expansion, ExpansionWriter, Pass, PassCapabilities, TransformContext};
use crate::DesugarError;
use sugo_rewriter::{PendingKind, PendingLambda};
use tree_sitter::Node;

/// Expands lambda placeholders.
#[derive(Debug, Default)]
pub struct LambdaPass;

impl Pass for LambdaPass {
    fn capabilities(&self) -> PassCapabilities {
        PassCapabilities::new("lambda").transform()
    }

    fn transform(
        &self,
        node: &Attached<'_>,
        cx: &TransformContext<'_>,
    ) -> Option<Result<Expansion, DesugarError>> {
        let PendingKind::Lambda(lambda) = &node.pending.kind else {
            return None;
        };
        let inferred = expected_type(node.node, cx.text, cx.facts);
        Some(expand(lambda, inferred, node, cx))
    }
}

/// Finds the function type expected at the argument position of `node`.
fn expected_type<'f>(node: Node<'_>, text: &str, facts: &'f Facts) -> Option<&'f FuncType> {
    let args = node.parent().filter(|n| n.kind() == "argument_list")?;
    let call = args.parent().filter(|n| n.kind() == "call_expression")?;
    let function = call
        .child_by_field_name("function")
        .filter(|n| n.kind() == "identifier")?;
    let signature = facts.signatures.get(node_text(function, text))?;

    let mut cursor = args.walk();
    let index = args
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .position(|n| n.id() == node.id())?;
    signature.params.get(index)?.as_ref()
}

fn expand(
    lambda: &PendingLambda,
    inferred: Option<&FuncType>,
    node: &Attached<'_>,
    cx: &TransformContext<'_>,
) -> Result<Expansion, DesugarError> {
    let fail = |reason: String| DesugarError::LambdaInference {
        reason,
        position: cx.position(lambda.head),
        span: lambda.head,
    };

    let needs_inference = lambda.params.iter().any(|p| p.ty.is_none());
    if needs_inference {
        match inferred {
            None => {
                return Err(fail(
                    "parameter types are missing and the lambda is not passed to a known function"
                        .to_string(),
                ))
            }
            Some(ty) if ty.params.len() != lambda.params.len() => {
                return Err(fail(format!(
                    "expected a function of {} parameter(s), found {}",
                    ty.params.len(),
                    lambda.params.len()
                )))
            }
            Some(_) => {}
        }
    }

    let mut w = ExpansionWriter::new();
    w.push("func(");
    for (i, param) in lambda.params.iter().enumerate() {
        if i > 0 {
            w.push(", ");
        }
        w.carry(&param.name).push(" ");
        match (&param.ty, inferred) {
            (Some(ty), _) => {
                w.carry(ty);
            }
            (None, Some(expected)) => {
                w.push(&expected.params[i]);
            }
            (None, None) => {
                return Err(fail(format!("cannot infer the type of `{}`", param.name.text)));
            }
        }
    }
    w.push(")");

    let has_result = match (&lambda.result, inferred.and_then(|t| t.result.as_deref())) {
        (Some(result), _) => {
            w.push(" ").carry(result);
            true
        }
        (None, Some(result)) => {
            w.push(" ").push(result);
            true
        }
        (None, None) => false,
    };

    if lambda.block {
        let indent = cx.indent_at(node.pending.stub.start_usize()).to_string();
        w.push(" {\n");
        w.carry_body(&lambda.body, &format!("{indent}\t"));
        w.push(&indent).push("}");
    } else if has_result {
        w.push(" { return ").carry(&lambda.body).push(" }");
    } else {
        w.push(" { ").carry(&lambda.body).push(" }");
    }

    Ok(w.finish(lambda.head))
}
