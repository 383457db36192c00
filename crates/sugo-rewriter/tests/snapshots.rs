//! Snapshot tests for the textual rewrite stage.
//!
//! These tests verify the rewriter output against known-good snapshots.

use sugo_rewriter::rewrite;

fn rewrite_snapshot(name: &str, source: &str) {
    let output = rewrite(source).unwrap();
    let pending: Vec<String> = output
        .pending
        .iter()
        .map(|node| {
            format!(
                "{} {:?} -> {:?}",
                node.kind.name(),
                node.original.slice(source),
                node.stub.slice(&output.text)
            )
        })
        .collect();

    let text = format!(
        "=== Source ===\n{}\n=== Go Output ===\n{}\n=== Pending ===\n{}\n=== End ===",
        source,
        output.text,
        pending.join("\n")
    );
    insta::assert_snapshot!(name, text);
}

#[test]
fn test_rewrite_enum_and_match() {
    rewrite_snapshot(
        "enum_and_match",
        r#"package main

enum Shape {
	Circle { r float64 }
	Square { s float64 }
}

func area(s Shape) float64 {
	let total = 0.0
	match s {
		Circle(c) => total = 3.14 * c.r * c.r
		Square(q) => total = q.s * q.s
	}
	return total
}
"#,
    );
}

#[test]
fn test_rewrite_expressions() {
    rewrite_snapshot(
        "expressions",
        r#"package main

func fetch(ids []int) ([]string, error) {
	names := mapIDs(ids, |id| lookup(id))
	first := client?.Cache?.Name
	resp := get(first)?
	return names, nil
}
"#,
    );
}
