//! Checks that every match covers its scrutinee's case set.
//!
//! The case set is decided by the arms' patterns: `Some`/`None` for options,
//! `Ok`/`Err` for results, otherwise the sum type owning the first variant.
//! A wildcard arm covers every missing case. Failures are collected so a file
//! reports all of them at once.

use crate::facts::MatchShape;
use crate::pass::{Discovery, Pass, PassCapabilities};
use crate::DesugarError;
use smol_str::SmolStr;
use sugo_rewriter::{MatchArm, Pattern, PendingKind, PendingMatch};

/// Classifies matches into [`crate::Facts::match_shapes`] and reports gaps.
#[derive(Debug, Default)]
pub struct ExhaustivenessPass;

impl Pass for ExhaustivenessPass {
    fn capabilities(&self) -> PassCapabilities {
        PassCapabilities::new("exhaustiveness").discover()
    }

    fn discover(&self, cx: &mut Discovery<'_, '_>) {
        for attached in cx.pending {
            let PendingKind::Match(m) = &attached.pending.kind else {
                continue;
            };
            match check(m, cx) {
                Ok(shape) => {
                    cx.facts.match_shapes.insert(attached.index, shape);
                }
                Err(err) => {
                    tracing::debug!(code = err.code(), "match precondition failed");
                    cx.errors.push(err);
                }
            }
        }
    }
}

fn shape_of(arm: &MatchArm, cx: &Discovery<'_, '_>) -> Result<Option<MatchShape>, DesugarError> {
    Ok(Some(match &arm.pattern {
        Pattern::Wildcard => return Ok(None),
        Pattern::Some(_) | Pattern::None => MatchShape::Option,
        Pattern::Ok(_) | Pattern::Err(_) => MatchShape::Result,
        Pattern::Variant { name, .. } => match cx.facts.variant_owner.get(name) {
            Some(owner) => MatchShape::Sum(owner.clone()),
            None => {
                return Err(DesugarError::UnknownScrutinee {
                    variant: name.to_string(),
                    position: cx.position(arm.pattern_span),
                    span: arm.pattern_span,
                })
            }
        },
    }))
}

fn check(m: &PendingMatch, cx: &Discovery<'_, '_>) -> Result<MatchShape, DesugarError> {
    let mut shape: Option<MatchShape> = None;
    let mut covered: Vec<&str> = Vec::new();
    let mut wildcard = false;

    for arm in &m.arms {
        let Some(arm_shape) = shape_of(arm, cx)? else {
            wildcard = true;
            continue;
        };
        match &shape {
            None => shape = Some(arm_shape),
            Some(existing) if *existing != arm_shape => {
                return Err(DesugarError::MixedPatterns {
                    first: existing.name().to_string(),
                    second: arm_shape.name().to_string(),
                    position: cx.position(arm.pattern_span),
                    span: arm.pattern_span,
                });
            }
            Some(_) => {}
        }
        if let Some(case) = arm.pattern.case_name() {
            covered.push(case);
        }
    }

    let Some(shape) = shape else {
        return Ok(MatchShape::Wildcard);
    };

    let required: Vec<SmolStr> = match &shape {
        MatchShape::Option => vec![SmolStr::new("Some"), SmolStr::new("None")],
        MatchShape::Result => vec![SmolStr::new("Ok"), SmolStr::new("Err")],
        MatchShape::Sum(name) => cx.facts.sum_types.get(name).cloned().unwrap_or_default(),
        MatchShape::Wildcard => Vec::new(),
    };
    let missing: Vec<String> = required
        .iter()
        .filter(|case| !covered.contains(&case.as_str()))
        .map(|case| case.to_string())
        .collect();

    if !wildcard && !missing.is_empty() {
        return Err(DesugarError::NonExhaustiveMatch {
            scrutinee_type: shape.name().to_string(),
            missing,
            position: cx.position(m.keyword),
            span: m.keyword,
        });
    }
    Ok(shape)
}
