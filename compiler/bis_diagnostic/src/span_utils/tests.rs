use super::*;
use pretty_assertions::assert_eq;

#[test]
fn line_and_column() {
    let source = "struct Point {\n    var x: Int;\n}\n";
    let table = LineOffsetTable::build(source);
    assert_eq!(table.offset_to_line_col(source, 0), (1, 1));
    assert_eq!(table.offset_to_line_col(source, 7), (1, 8));
    assert_eq!(table.offset_to_line_col(source, 19), (2, 5));
    assert_eq!(table.line_count(), 4);
}

#[test]
fn line_text_excludes_newline() {
    let source = "a\nbcd\ne";
    let table = LineOffsetTable::build(source);
    assert_eq!(table.line_text(source, 2), Some("bcd"));
    assert_eq!(table.line_text(source, 3), Some("e"));
    assert_eq!(table.line_text(source, 9), None);
    assert_eq!(table.line_text(source, 0), None);
}
