//! Tests that positions in the rewritten Go map back to the sugo source.
//!
//! These build a source map straight from the textual records; no structural
//! corrections are involved.

use pretty_assertions::assert_eq;
use source_map::{LineIndex, Position, PositionTranslator, SourceMapBuilder};
use std::sync::Arc;
use sugo_rewriter::rewrite;

fn translator(source: &str) -> (String, PositionTranslator) {
    let output = rewrite(source).unwrap();
    let index = LineIndex::new(source);
    let map = SourceMapBuilder::new(&index, &output.text, &output.records)
        .source_name("test.sugo")
        .build();
    (output.text, PositionTranslator::new(Arc::new(map)))
}

/// Finds `needle` in `text` and returns its 1-indexed position.
fn position_of(text: &str, needle: &str) -> Position {
    let offset = text
        .find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in:\n{text}"));
    LineIndex::new(text)
        .position((offset as u32).into())
        .unwrap()
}

#[test]
fn test_guard_block_maps_to_operator() {
    let source = "package main\n\nfunc load(path string) (*Config, error) {\n\tcfg := readConfig(path)?\n\treturn cfg, nil\n}\n";
    let (generated, translator) = translator(source);
    assert_eq!(
        generated,
        "package main\n\nfunc load(path string) (*Config, error) {\n\tcfg, __err1 := readConfig(path)\n\tif __err1 != nil {\n\t\treturn nil, __err1\n\t}\n\treturn cfg, nil\n}\n"
    );

    let operator = Position::new(4, 25);
    // The bound variable keeps its own column.
    assert_eq!(translator.forward(Position::new(4, 2)), Ok(Position::new(4, 2)));
    // Every synthesized line points at `?`.
    for line in 5..=7 {
        assert_eq!(translator.forward(Position::new(line, 1)), Ok(operator));
        assert_eq!(translator.forward(Position::new(line, 2)), Ok(operator));
    }
    assert_eq!(translator.forward(Position::new(4, 6)), Ok(operator));
    // The carried expression maps character for character.
    assert_eq!(translator.forward(Position::new(4, 17)), Ok(Position::new(4, 9)));
    assert_eq!(translator.forward(Position::new(4, 28)), Ok(Position::new(4, 20)));
    // Code after the block is shifted back.
    assert_eq!(translator.forward(Position::new(8, 2)), Ok(Position::new(5, 2)));
}

#[test]
fn test_let_maps_name_and_value() {
    let source = "func main() {\n\tlet count = 42\n}\n";
    let (generated, translator) = translator(source);
    let name = position_of(&generated, "count");
    let value = position_of(&generated, "42");
    assert_eq!(translator.forward(name), Ok(Position::new(2, 6)));
    assert_eq!(translator.forward(value), Ok(Position::new(2, 14)));
    assert_eq!(translator.reverse(Position::new(2, 14)), Ok(value));
}

#[test]
fn test_enum_lines_map_to_declaration() {
    let source = "enum Shape {\n\tCircle { r float64 }\n\tEmpty\n}\n";
    let (generated, translator) = translator(source);

    let interface = position_of(&generated, "type Shape");
    assert_eq!(translator.forward(interface), Ok(Position::new(1, 1)));
    let name = position_of(&generated, "Shape interface");
    assert_eq!(translator.forward(name), Ok(Position::new(1, 6)));
    let field = position_of(&generated, "r float64");
    assert_eq!(translator.forward(field), Ok(Position::new(2, 11)));
    let method = position_of(&generated, "func (Empty)");
    assert_eq!(translator.forward(method), Ok(Position::new(3, 2)));
}

#[test]
fn test_copy_regions_are_monotonic() {
    let source = "package main\n\nfunc add(a, b int) int {\n\treturn a + b\n}\n";
    let (_, translator) = translator(source);
    let map = translator.source_map();
    for line in 1..=5 {
        let columns: Vec<u32> = map.line(line).iter().map(|m| m.source_column).collect();
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(columns, sorted, "line {line}");
    }
}
