//! Facts collected by discovery passes and read by transforms.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// The case set a match was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchShape {
    /// `Some` / `None` over a pointer.
    Option,
    /// `Ok` / `Err` over a `Result[T]`.
    Result,
    /// Variants of the named sum type.
    Sum(SmolStr),
    /// Only a wildcard arm.
    Wildcard,
}

impl MatchShape {
    /// Returns the name used for this case set in messages.
    pub fn name(&self) -> &str {
        match self {
            MatchShape::Option => "Option",
            MatchShape::Result => "Result",
            MatchShape::Sum(name) => name,
            MatchShape::Wildcard => "_",
        }
    }
}

/// The shape of a top-level function parameter of function type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncType {
    /// Parameter types, one per parameter.
    pub params: Vec<String>,
    /// The result type text, if any.
    pub result: Option<String>,
}

/// A top-level function signature, reduced to what lambda inference needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncSignature {
    /// One entry per parameter; `Some` when the parameter has a function type.
    pub params: Vec<Option<FuncType>>,
}

/// Facts shared between passes.
#[derive(Debug, Default)]
pub struct Facts {
    /// Sum type name to its variants, in declaration order.
    pub sum_types: FxHashMap<SmolStr, Vec<SmolStr>>,
    /// Variant name to the sum type it belongs to.
    pub variant_owner: FxHashMap<SmolStr, SmolStr>,
    /// Top-level function name to its signature.
    pub signatures: FxHashMap<SmolStr, FuncSignature>,
    /// Pending index to the checked case set of a match.
    pub match_shapes: FxHashMap<usize, MatchShape>,
}

impl Facts {
    /// Registers a sum type with its variants.
    pub fn add_sum_type(&mut self, name: impl Into<SmolStr>, variants: Vec<SmolStr>) {
        let name = name.into();
        for variant in &variants {
            self.variant_owner.insert(variant.clone(), name.clone());
        }
        self.sum_types.insert(name, variants);
    }
}
