//! Rendering transpiler and proxied diagnostics at original positions.

use pretty_assertions::assert_eq;
use source_map::{LineIndex, Position};
use std::sync::Arc;
use sugo_bridge::transpile;
use sugo_diagnostics::{
    CoordinateSpace, Diagnostic, DiagnosticCode, DiagnosticPresenter, LineCache, Severity,
};

#[test]
fn test_non_exhaustive_match_rendering() {
    let source = "package main\n\nfunc show(v *int) {\n\tx := 1\n\tmatch v {\n\t\tSome(n) => fmt.Println(n)\n\t}\n}\n";
    let err = transpile(source, "src/opt.sugo").unwrap_err();
    let diags = Diagnostic::from_transpile_error("src/opt.sugo", &LineIndex::new(source), &err);

    let cache = Arc::new(LineCache::new());
    cache.insert("src/opt.sugo", source);
    let presenter = DiagnosticPresenter::new(cache);

    assert_eq!(diags.len(), 1);
    assert_eq!(
        presenter.render(&diags[0], None),
        "error[non-exhaustive-match]: match over Option is not exhaustive\n --> src/opt.sugo:5:2\n  |\n3 | func show(v *int) {\n4 | \tx := 1\n5 | \tmatch v {\n  | \t^^^^^ missing arm\n6 | \t\tSome(n) => fmt.Println(n)\n7 | \t}\n  |\n  = suggestion:\n  |     None => ...\n  = missing cases: None\n"
    );
}

#[test]
fn test_generated_diagnostic_maps_to_original() {
    let source = "package main\n\nfunc load(path string) (*Config, error) {\n\tcfg := readConfig(path)?\n\treturn cfg, nil\n}\n";
    let out = transpile(source, "load.sugo").unwrap();
    let translator = out.translator();

    let cache = Arc::new(LineCache::new());
    cache.insert("load.sugo", source);
    let presenter = DiagnosticPresenter::new(cache);

    // A server diagnostic on the synthesized `return nil, __err1` line.
    let diag = Diagnostic::new(
        DiagnosticCode::Gopls,
        "cannot use nil as Config value",
        "load.sugo",
        Position::new(6, 10),
    )
    .with_end(Position::new(6, 13))
    .in_generated();

    let resolved = presenter.resolve(&diag, &translator);
    assert_eq!(resolved.space, CoordinateSpace::Original);
    assert_eq!(resolved.start, Position::new(4, 25));
    assert_eq!(resolved.end, None);
    assert_eq!(resolved.severity, Severity::Warning);

    let rendered = presenter.render(&diag, Some(&translator));
    assert!(rendered.contains(" --> load.sugo:4:25\n"), "{rendered}");
    assert!(rendered.contains("4 | \tcfg := readConfig(path)?\n"), "{rendered}");
}

#[test]
fn test_copied_region_keeps_its_range() {
    let source = "package main\n\nfunc main() {\n\tlet total = compute()\n\t_ = total\n}\n";
    let out = transpile(source, "main.sugo").unwrap();
    let translator = out.translator();
    let presenter = DiagnosticPresenter::default();

    // `compute` on generated line 4 is copied text.
    let start = LineIndex::new(&out.generated)
        .position((out.generated.find("compute").unwrap() as u32).into())
        .unwrap();
    let diag = Diagnostic::new(DiagnosticCode::Gopls, "undefined: compute", "main.sugo", start)
        .with_end(Position::new(start.line, start.column + 7))
        .in_generated();

    let resolved = presenter.resolve(&diag, &translator);
    assert_eq!(resolved.start, Position::new(4, 14));
    assert_eq!(resolved.end, Some(Position::new(4, 21)));
}
