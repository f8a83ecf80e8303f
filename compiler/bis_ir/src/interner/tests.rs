use super::*;
use pretty_assertions::assert_eq;

#[test]
fn intern_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("Point");
    let b = interner.intern("Point");
    let c = interner.intern("Line");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn lookup_returns_text() {
    let interner = StringInterner::new();
    let name = interner.intern("appendString");
    assert_eq!(interner.lookup(name), "appendString");
    assert_eq!(interner.lookup(Name::EMPTY), "");
}

#[test]
fn get_does_not_insert() {
    let interner = StringInterner::new();
    let before = interner.len();
    assert_eq!(interner.get("missing"), None);
    assert_eq!(interner.len(), before);
    let name = interner.intern("missing");
    assert_eq!(interner.get("missing"), Some(name));
}
