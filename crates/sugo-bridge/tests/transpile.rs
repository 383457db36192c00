//! End-to-end transpilation tests: generated Go and mapped positions.

use pretty_assertions::assert_eq;
use source_map::{LineIndex, Position};
use sugo_bridge::{
    transpile, AstBridge, DesugarError, SumTypesPass, TranspileError, Transpiled, Transpiler,
};
use sugo_rewriter::RewriteEngine;

fn ok(source: &str) -> Transpiled {
    transpile(source, "main.sugo").unwrap_or_else(|e| panic!("transpile failed: {e:?}"))
}

fn desugar_errors(source: &str) -> Vec<DesugarError> {
    match transpile(source, "main.sugo") {
        Err(TranspileError::Desugar(errors)) => errors,
        other => panic!("expected structural errors, got {other:?}"),
    }
}

/// Finds `needle` in `text` and returns its 1-indexed position.
fn position_of(text: &str, needle: &str) -> Position {
    let offset = text
        .find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in:\n{text}"));
    LineIndex::new(text).position((offset as u32).into()).unwrap()
}

#[test]
fn test_error_propagation_through_pipeline() {
    let source = "package main\n\nfunc load(path string) (*Config, error) {\n\tcfg := readConfig(path)?\n\treturn cfg, nil\n}\n";
    let out = ok(source);
    assert_eq!(
        out.generated,
        "package main\n\nfunc load(path string) (*Config, error) {\n\tcfg, __err1 := readConfig(path)\n\tif __err1 != nil {\n\t\treturn nil, __err1\n\t}\n\treturn cfg, nil\n}\n"
    );
    let translator = out.translator();
    for line in 5..=7 {
        assert_eq!(
            translator.forward(Position::new(line, 2)).unwrap(),
            Position::new(4, 25),
            "generated line {line}"
        );
    }
    assert_eq!(translator.forward(Position::new(8, 2)).unwrap(), Position::new(5, 2));
}

#[test]
fn test_option_match_missing_none() {
    let source = "package main\n\nfunc show(v *int) {\n\tmatch v {\n\t\tSome(n) => fmt.Println(n)\n\t}\n}\n";
    let errors = desugar_errors(source);
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        DesugarError::NonExhaustiveMatch {
            scrutinee_type,
            missing,
            position,
            ..
        } => {
            assert_eq!(scrutinee_type, "Option");
            assert_eq!(missing, &vec!["None".to_string()]);
            assert_eq!(*position, Position::new(4, 2));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_every_match_error_is_reported() {
    let source = "package main\n\nfunc f(v *int, r Result[int]) {\n\tmatch v {\n\t\tNone => a()\n\t}\n\tmatch r {\n\t\tOk(x) => b(x)\n\t}\n}\n";
    let errors = desugar_errors(source);
    let missing: Vec<&[String]> = errors.iter().map(|e| e.missing_cases()).collect();
    assert_eq!(missing, vec![&["Some".to_string()][..], &["Err".to_string()][..]]);
}

#[test]
fn test_option_match_expansion() {
    let source = "package main\n\nimport \"fmt\"\n\nfunc show(v *int) {\n\tmatch v {\n\t\tSome(n) => fmt.Println(n)\n\t\tNone => {\n\t\t\tfmt.Println(\"none\")\n\t\t}\n\t}\n}\n";
    let out = ok(source);
    assert_eq!(
        out.generated,
        "package main\n\nimport \"fmt\"\n\nfunc show(v *int) {\n\tif __m := v; __m != nil {\n\t\tn := *__m\n\t\t_ = n\n\t\tfmt.Println(n)\n\t} else {\n\t\tfmt.Println(\"none\")\n\t}\n}\n"
    );

    let translator = out.translator();
    // Synthesized control flow maps to the match keyword.
    assert_eq!(translator.forward(Position::new(6, 2)).unwrap(), Position::new(6, 2));
    assert_eq!(translator.forward(Position::new(10, 2)).unwrap(), Position::new(6, 2));
    // Carried arm bodies map character for character.
    assert_eq!(translator.forward(Position::new(9, 3)).unwrap(), Position::new(7, 14));
    assert_eq!(translator.forward(Position::new(11, 3)).unwrap(), Position::new(9, 4));
    // The binding maps to the pattern's identifier.
    assert_eq!(translator.forward(Position::new(7, 3)).unwrap(), Position::new(7, 8));
}

#[test]
fn test_result_declaration_is_injected_once() {
    let source = "package main\n\nimport \"fmt\"\n\nfunc report(r Result[int]) {\n\tmatch r {\n\t\tOk(v) => fmt.Println(v)\n\t\tErr(e) => fmt.Println(e)\n\t}\n}\n\nfunc again(r Result[int]) {\n\tmatch r {\n\t\tOk(v) => fmt.Println(v)\n\t\t_ => return\n\t}\n}\n";
    let out = ok(source);
    assert_eq!(
        out.generated,
        "package main\n\nimport \"fmt\"\n\ntype Result[T any] struct {\n\tValue T\n\tErr   error\n}\n\nfunc report(r Result[int]) {\n\tif __m := r; __m.Err == nil {\n\t\tv := __m.Value\n\t\t_ = v\n\t\tfmt.Println(v)\n\t} else {\n\t\te := __m.Err\n\t\t_ = e\n\t\tfmt.Println(e)\n\t}\n}\n\nfunc again(r Result[int]) {\n\tif __m := r; __m.Err == nil {\n\t\tv := __m.Value\n\t\t_ = v\n\t\tfmt.Println(v)\n\t} else {\n\t\treturn\n\t}\n}\n"
    );
    assert_eq!(out.generated.matches("type Result[").count(), 1);

    // The declaration is attributed to the first match that needed it.
    let translator = out.translator();
    let declaration = position_of(&out.generated, "type Result");
    assert_eq!(translator.forward(declaration).unwrap(), Position::new(6, 2));
}

#[test]
fn test_sum_type_match_becomes_type_switch() {
    let source = "package main\n\nenum Shape {\n\tCircle { r float64 }\n\tEmpty\n}\n\nfunc area(s Shape) float64 {\n\tmatch s {\n\t\tCircle(c) => return c.r * c.r\n\t\tEmpty => return 0\n\t}\n\treturn 0\n}\n";
    let out = ok(source);
    let expected_func = "func area(s Shape) float64 {\n\tswitch __m := s.(type) {\n\tcase Circle:\n\t\tc := __m\n\t\t_ = c\n\t\treturn c.r * c.r\n\tcase Empty:\n\t\treturn 0\n\t}\n\treturn 0\n}\n";
    assert!(
        out.generated.ends_with(expected_func),
        "unexpected output:\n{}",
        out.generated
    );

    let translator = out.translator();
    let case = position_of(&out.generated, "case Empty");
    let variant = Position::new(case.line, case.column + 5);
    assert_eq!(translator.forward(variant).unwrap(), Position::new(11, 3));
}

#[test]
fn test_sum_type_match_without_bindings() {
    let source = "package main\n\nenum Color { Red, Green }\n\nfunc name(c Color) string {\n\tmatch c {\n\t\tRed => return \"red\"\n\t\t_ => return \"other\"\n\t}\n\treturn \"\"\n}\n";
    let out = ok(source);
    assert!(out.generated.contains(
        "\tswitch c.(type) {\n\tcase Red:\n\t\treturn \"red\"\n\tdefault:\n\t\treturn \"other\"\n\t}\n"
    ));
}

#[test]
fn test_unknown_variant() {
    let source = "package main\n\nfunc f(s Shape) {\n\tmatch s {\n\t\tCircle(c) => use(c)\n\t}\n}\n";
    let errors = desugar_errors(source);
    assert!(matches!(
        &errors[..],
        [DesugarError::UnknownScrutinee { variant, .. }] if variant == "Circle"
    ));
}

#[test]
fn test_mixed_patterns() {
    let source = "package main\n\nfunc f(v *int) {\n\tmatch v {\n\t\tSome(n) => a(n)\n\t\tOk(x) => b(x)\n\t}\n}\n";
    let errors = desugar_errors(source);
    match &errors[..] {
        [DesugarError::MixedPatterns {
            first,
            second,
            position,
            ..
        }] => {
            assert_eq!((first.as_str(), second.as_str()), ("Option", "Result"));
            assert_eq!(*position, Position::new(6, 3));
        }
        other => panic!("unexpected errors {other:?}"),
    }
}

const APPLY: &str = "package main\n\nfunc apply(xs []int, f func(int) int) []int {\n\tout := make([]int, 0, len(xs))\n\tfor _, x := range xs {\n\t\tout = append(out, f(x))\n\t}\n\treturn out\n}\n\nfunc main() {\n\txs := []int{1, 2}\n";

#[test]
fn test_lambda_types_are_inferred() {
    let source = format!("{APPLY}\tys := apply(xs, |x| x * 2)\n\t_ = ys\n}}\n");
    let out = ok(&source);
    assert!(out
        .generated
        .contains("\tys := apply(xs, func(x int) int { return x * 2 })\n"));

    let translator = out.translator();
    // The body carried into the literal.
    assert_eq!(translator.forward(Position::new(13, 43)).unwrap(), Position::new(13, 22));
    // The parameter name.
    assert_eq!(translator.forward(Position::new(13, 23)).unwrap(), Position::new(13, 19));
    // An inferred type is attributed to the lambda head.
    assert_eq!(translator.forward(Position::new(13, 25)).unwrap(), Position::new(13, 18));
}

#[test]
fn test_typed_block_lambda() {
    let source = "package main\n\nfunc main() {\n\tcheck := |n: int| -> bool {\n\t\treturn n > 0\n\t}\n\t_ = check\n}\n";
    let out = ok(source);
    assert_eq!(
        out.generated,
        "package main\n\nfunc main() {\n\tcheck := func(n int) bool {\n\t\treturn n > 0\n\t}\n\t_ = check\n}\n"
    );
}

#[test]
fn test_lambda_without_types_or_context() {
    let source = "package main\n\nfunc main() {\n\tf := |x| x + 1\n\t_ = f\n}\n";
    let errors = desugar_errors(source);
    match &errors[..] {
        [DesugarError::LambdaInference { position, .. }] => {
            assert_eq!(*position, Position::new(4, 7));
        }
        other => panic!("unexpected errors {other:?}"),
    }
}

#[test]
fn test_safe_navigation_expansion() {
    let source = "package main\n\nfunc city(u *User) any {\n\tc := u.Profile?.Address?.City\n\treturn c\n}\n";
    let out = ok(source);
    assert!(out.generated.contains(
        "\tc := func() any { if u.Profile == nil { return nil }; if u.Profile.Address == nil { return nil }; return u.Profile.Address.City }()\n"
    ));

    let translator = out.translator();
    let city = position_of(&out.generated, "City }");
    assert_eq!(translator.forward(city).unwrap(), Position::new(4, 27));
}

#[test]
fn test_syntax_error_in_carried_body() {
    let source = "package main\n\nfunc show(v *int) {\n\tmatch v {\n\t\tSome(n) => x := := n\n\t\tNone => a()\n\t}\n}\n";
    match transpile(source, "main.sugo") {
        Err(TranspileError::Parse(err)) => {
            assert!((4..=7).contains(&err.position.line), "at {}", err.position);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_missing_transform_pass_is_reported() {
    let transpiler = Transpiler::new(
        RewriteEngine::default(),
        AstBridge::new(vec![Box::new(SumTypesPass)]),
    );
    let source = "package main\n\nfunc main() {\n\trun(|| work())\n}\n";
    let err = transpiler.transpile(source, "main.sugo").unwrap_err();
    match err {
        TranspileError::Desugar(errors) => {
            assert!(matches!(
                &errors[..],
                [DesugarError::DetachedPlaceholder { construct: "lambda", .. }]
            ));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_source_map_json_names_the_original() {
    let out = ok("package main\n\nfunc main() {\n\tlet x = 1\n\t_ = x\n}\n");
    let json = out.source_map_json("main.go", None);
    assert_eq!(json.version, 3);
    assert_eq!(json.sources, vec!["main.sugo".to_string()]);
    assert!(!json.mappings.is_empty());
}
