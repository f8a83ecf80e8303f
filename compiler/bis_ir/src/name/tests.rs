use super::*;
use pretty_assertions::assert_eq;

#[test]
fn raw_round_trips() {
    let name = Name::from_raw(42);
    assert_eq!(name.raw(), 42);
    assert_eq!(name.index(), 42);
}

#[test]
fn default_is_empty() {
    assert_eq!(Name::default(), Name::EMPTY);
    assert_eq!(format!("{:?}", Name::from_raw(7)), "Name(7)");
}
