use super::*;
use pretty_assertions::assert_eq;

#[test]
fn merge_covers_both() {
    let a = Span::new(4, 9);
    let b = Span::new(2, 6);
    assert_eq!(a.merge(b), Span::new(2, 9));
    assert_eq!(b.merge(a), Span::new(2, 9));
}

#[test]
fn try_from_range_rejects_inverted() {
    assert_eq!(
        Span::try_from_range(7..3),
        Err(SpanError::Inverted { start: 7, end: 3 })
    );
    assert_eq!(Span::try_from_range(3..7), Ok(Span::new(3, 7)));
}

#[test]
fn dummy_displays_as_builtin() {
    assert_eq!(Span::DUMMY.to_string(), "<builtin>");
    assert_eq!(Span::new(1, 3).to_string(), "1..3");
    assert!(Span::DUMMY.is_dummy());
    assert!(!Span::new(0, 1).is_dummy());
}

#[test]
fn contains_span() {
    let outer = Span::new(0, 10);
    assert!(outer.contains_span(Span::new(2, 4)));
    assert!(!outer.contains_span(Span::new(8, 12)));
    assert_eq!(outer.len(), 10);
    assert!(Span::new(5, 5).is_empty());
}
