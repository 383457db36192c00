//! Diagnostics for sugo.
//!
//! This crate provides:
//! - The [`Diagnostic`] model shared by the CLI and the language server proxy
//! - Conversion of transpiler errors into diagnostics
//! - A [`LineCache`] of immutable, line-indexed file contents
//! - The [`DiagnosticPresenter`], which renders a diagnostic at its original
//!   location with a context snippet, caret underline and suggestions
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use source_map::Position;
//! use sugo_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticPresenter, LineCache};
//!
//! let cache = Arc::new(LineCache::new());
//! cache.insert("main.sugo", "package main\n");
//! let presenter = DiagnosticPresenter::new(cache);
//! let diag = Diagnostic::new(DiagnosticCode::ParseError, "unexpected `}`", "main.sugo", Position::new(1, 1));
//! assert!(presenter.render(&diag, None).starts_with("error[parse-error]"));
//! ```

mod cache;
mod convert;
mod diagnostic;
mod presenter;

pub use cache::LineCache;
pub use diagnostic::{CoordinateSpace, Diagnostic, DiagnosticCode, Severity};
pub use presenter::{DiagnosticPresenter, JsonDiagnostic, JsonPosition};
