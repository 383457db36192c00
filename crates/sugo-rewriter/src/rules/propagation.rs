//! Error propagation: a statement ending in `?` becomes an explicit guard.
//!
//! ```text
//! x := load(path)?          x, __err1 := load(path)
//!                    =>     if __err1 != nil {
//!                           	return nil, __err1
//!                           }
//! ```
//!
//! Every synthesized character is anchored to the `?` operator. The bound
//! names and the expression are carried and keep their own columns.

use super::Rule;
use crate::engine::Rewriter;
use crate::lexer::TokenKind;
use crate::{RewriteError, RewriteErrorKind};
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// `x := e?` and `let x = e?`
    Define,
    /// `x = e?`
    Assign,
    /// `e?`
    Bare,
}

impl Rewriter<'_> {
    /// Rewrites the statement at `i` if it ends in `?`.
    pub(crate) fn rewrite_propagation(&mut self, i: usize) -> Result<Option<usize>, RewriteError> {
        let end = self.statement_end(i);
        let Some(question) = self.prev_sig(end).filter(|&q| q >= i) else {
            return Ok(None);
        };
        if self.kind(question) != TokenKind::Question {
            return Ok(None);
        }

        let (names, binding, expr_start) = self.parse_binding(i);
        if expr_start >= question {
            return Err(self.malformed(
                Rule::ErrorPropagation,
                question,
                "error propagation",
                "missing expression before `?`",
            ));
        }
        self.ensure_plain(expr_start, question, "error propagation", Rule::ErrorPropagation)?;
        if binding == Binding::Bare {
            self.ensure_no_assignment(expr_start, question)?;
        }

        let anchor = self.span(question);
        let signature = match self.scopes.last() {
            Some(scope) if scope.signature.returns_error() => scope.signature.clone(),
            _ => {
                return Err(self.error(
                    Rule::ErrorPropagation.id(),
                    anchor,
                    RewriteErrorKind::NoErrorResult,
                ))
            }
        };

        self.error_vars += 1;
        let err = format!("__err{}", self.error_vars);
        let indent = self.indent_of(self.span(i).start_usize()).to_string();
        let mut returns = signature.zero_values();
        returns.push(err.clone());
        let guard = format!(
            "{indent}\treturn {}\n{indent}}}",
            returns.join(", ")
        );
        let expr = self.fragment(expr_start, question).span;

        self.copy_to(self.span(i).start_usize());
        let rule = Rule::ErrorPropagation;
        match binding {
            Binding::Define | Binding::Assign => {
                if binding == Binding::Assign {
                    self.synthesize(rule, anchor, &format!("var {err} error\n{indent}"));
                }
                for (idx, &name) in names.iter().enumerate() {
                    if idx > 0 {
                        self.synthesize(rule, anchor, ", ");
                    }
                    self.carry(self.span(name), Some(SmolStr::new(self.text(name))));
                }
                let op = if binding == Binding::Define { ":=" } else { "=" };
                self.synthesize(rule, anchor, &format!(", {err} {op} "));
                self.carry(expr, None);
                self.synthesize(
                    rule,
                    anchor,
                    &format!("\n{indent}if {err} != nil {{\n{guard}"),
                );
            }
            Binding::Bare => {
                self.synthesize(rule, anchor, &format!("if {err} := "));
                self.carry(expr, None);
                self.synthesize(rule, anchor, &format!("; {err} != nil {{\n{guard}"));
            }
        }
        self.skip_to(anchor.end_usize());

        Ok(Some(question + 1))
    }

    /// Splits `names := ` / `names = ` / `let names = ` off the statement.
    fn parse_binding(&self, i: usize) -> (Vec<usize>, Binding, usize) {
        let (first, is_let) = if self.kind(i) == TokenKind::Let {
            (self.next_sig(i), true)
        } else {
            (i, false)
        };
        if let Some((names, after)) = self.parse_names(first) {
            let binding = match self.kind(after) {
                TokenKind::Define => Some(Binding::Define),
                TokenKind::Assign if is_let => Some(Binding::Define),
                TokenKind::Assign => Some(Binding::Assign),
                _ => None,
            };
            if let Some(binding) = binding {
                return (names, binding, self.next_code(after));
            }
        }
        (Vec::new(), Binding::Bare, i)
    }

    /// A bare form must not assign to anything but plain names.
    fn ensure_no_assignment(&self, from: usize, to: usize) -> Result<(), RewriteError> {
        let mut j = from;
        while j < to {
            if matches!(self.kind(j), TokenKind::Assign | TokenKind::Define) {
                return Err(self.malformed(
                    Rule::ErrorPropagation,
                    j,
                    "error propagation",
                    "only plain identifiers can be bound",
                ));
            }
            j = self.skip_group(j).unwrap_or(to);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{rewrite, RewriteErrorKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_define_expands_to_guard_block() {
        let source = "func load() (int, error) {\n\tx := parse()?\n\treturn x, nil\n}\n";
        let output = rewrite(source).unwrap();
        assert_eq!(
            output.text,
            "func load() (int, error) {\n\tx, __err1 := parse()\n\tif __err1 != nil {\n\t\treturn 0, __err1\n\t}\n\treturn x, nil\n}\n"
        );
    }

    #[test]
    fn test_bare_form() {
        let source = "func save() error {\n\twrite()?\n\treturn nil\n}\n";
        let output = rewrite(source).unwrap();
        assert_eq!(
            output.text,
            "func save() error {\n\tif __err1 := write(); __err1 != nil {\n\t\treturn __err1\n\t}\n\treturn nil\n}\n"
        );
    }

    #[test]
    fn test_assign_form_declares_error() {
        let source = "func f() (string, error) {\n\tvar s string\n\ts = read()?\n\treturn s, nil\n}\n";
        let output = rewrite(source).unwrap();
        assert!(output
            .text
            .contains("\tvar __err1 error\n\ts, __err1 = read()\n\tif __err1 != nil {\n\t\treturn \"\", __err1\n\t}\n"));
    }

    #[test]
    fn test_let_form_and_counter() {
        let source = "func f() (*T, error) {\n\tlet a = one()?\n\tb := two(a)?\n\treturn b, nil\n}\n";
        let output = rewrite(source).unwrap();
        assert!(output.text.contains("a, __err1 := one()\n"));
        assert!(output.text.contains("b, __err2 := two(a)\n"));
        assert!(output.text.contains("return nil, __err2"));
    }

    #[test]
    fn test_named_results_and_struct_zero() {
        let source = "func f() (u User, n int, err error) {\n\tu = get()?\n\treturn\n}\n";
        let output = rewrite(source).unwrap();
        assert!(output.text.contains("return *new(User), 0, __err1"));
    }

    #[test]
    fn test_bound_name_is_carried_with_name() {
        let output = rewrite("func f() error {\n\tvalue := get()?\n\t_ = value\n\treturn nil\n}\n").unwrap();
        let carried = output
            .records
            .iter()
            .find(|r| r.name.as_deref() == Some("value"))
            .unwrap();
        assert_eq!(carried.rule.as_str(), "carry");
        assert_eq!(carried.generated.slice(&output.text), "value");
    }

    #[test]
    fn test_requires_error_result() {
        let err = rewrite("func f() int {\n\tx := g()?\n\treturn x\n}\n").unwrap_err();
        assert_eq!(err.reason, RewriteErrorKind::NoErrorResult);
        assert_eq!(err.position.line, 2);
        assert_eq!(err.position.column, 10);
    }

    #[test]
    fn test_question_must_end_statement() {
        let err = rewrite("func f() error {\n\tx := g()? + 1\n\treturn nil\n}\n").unwrap_err();
        assert_eq!(err.reason, RewriteErrorKind::QuestionNotAtEnd);
    }

    #[test]
    fn test_question_inside_call_is_rejected() {
        let err = rewrite("func f() error {\n\tuse(g()?)\n\treturn nil\n}\n").unwrap_err();
        assert_eq!(err.reason, RewriteErrorKind::QuestionNotAtEnd);
    }

    #[test]
    fn test_question_must_start_its_line() {
        let err = rewrite("func f() error {\n\tif ok { g()? }\n\treturn nil\n}\n").unwrap_err();
        assert_eq!(err.reason, RewriteErrorKind::NotAStatement);
    }

    #[test]
    fn test_nested_sugar_is_rejected() {
        let err = rewrite("func f() error {\n\tx := apply(|v| v)?\n\treturn nil\n}\n").unwrap_err();
        assert!(matches!(
            err.reason,
            RewriteErrorKind::DisallowedNesting { inner: "lambda", .. }
        ));
    }

    #[test]
    fn test_field_assignment_is_rejected() {
        let err = rewrite("func f() error {\n\ts.x = g()?\n\treturn nil\n}\n").unwrap_err();
        assert!(matches!(err.reason, RewriteErrorKind::Malformed { .. }));
    }

    #[test]
    fn test_func_literal_scope() {
        let source = "func f() {\n\th := func() error {\n\t\tx := g()?\n\t\treturn use(x)\n\t}\n\t_ = h\n}\n";
        let output = rewrite(source).unwrap();
        assert!(output.text.contains("\t\tx, __err1 := g()\n\t\tif __err1 != nil {\n\t\t\treturn __err1\n\t\t}\n"));
    }
}
