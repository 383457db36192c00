//! Structural desugaring of rewritten sugo, and the transpile pipeline.
//!
//! The textual pass leaves stubs for constructs that need type information.
//! This crate parses the rewritten text with tree-sitter-go, attaches each
//! pending node to its stub, runs ordered passes over the tree and splices
//! the expansions back, keeping provenance:
//! - [`SumTypesPass`], [`SignaturesPass`] discover facts
//! - [`ExhaustivenessPass`] checks every match
//! - [`LambdaPass`], [`MatchPass`], [`SafeNavPass`] expand placeholders
//!
//! # Example
//!
//! ```
//! use sugo_bridge::transpile;
//!
//! let source = "package main\n\nfunc main() {\n\tlet x = 1\n\t_ = x\n}\n";
//! let out = transpile(source, "main.sugo").unwrap();
//! assert!(out.generated.contains("x := 1"));
//! ```

mod bridge;
mod error;
mod facts;
mod parse;
mod pass;
pub mod passes;
mod pipeline;
mod splice;

pub use bridge::{AstBridge, BridgeError, BridgeOutput, INJECTED};
pub use error::{DesugarError, ParseError};
pub use facts::{Facts, FuncSignature, FuncType, MatchShape};
pub use pass::{
    Attached, Declaration, Discovery, Expansion, ExpansionWriter, Pass, PassCapabilities,
    TransformContext,
};
pub use passes::{
    default_passes, ExhaustivenessPass, LambdaPass, MatchPass, SafeNavPass, SignaturesPass,
    SumTypesPass,
};
pub use pipeline::{transpile, TranspileError, Transpiled, Transpiler};
