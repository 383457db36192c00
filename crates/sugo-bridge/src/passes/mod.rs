//! The built-in structural passes, in execution order.

mod exhaustiveness;
mod lambda;
mod matching;
mod safe_nav;
mod signatures;
mod sum_types;

pub use exhaustiveness::ExhaustivenessPass;
pub use lambda::LambdaPass;
pub use matching::{MatchPass, RESULT_DECLARATION};
pub use safe_nav::SafeNavPass;
pub use signatures::SignaturesPass;
pub use sum_types::SumTypesPass;

use crate::pass::Pass;

/// Returns the built-in passes in execution order.
///
/// Sum types and signatures are discovered before exhaustiveness checks
/// consult them; transforms run after every discovery hook.
pub fn default_passes() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(SumTypesPass),
        Box::new(SignaturesPass),
        Box::new(ExhaustivenessPass),
        Box::new(LambdaPass),
        Box::new(MatchPass),
        Box::new(SafeNavPass),
    ]
}
