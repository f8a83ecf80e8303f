use super::*;
use pretty_assertions::assert_eq;

#[test]
fn user_diagnostics_stay_user() {
    let err: CompileError = Diagnostic::error(ErrorCode::E4001)
        .with_message("no instance")
        .into();
    assert!(!err.is_internal());
    assert_eq!(err.code(), ErrorCode::E4001);
}

#[test]
fn internal_codes_become_internal() {
    let err: CompileError = Diagnostic::error(ErrorCode::E9001).into();
    assert!(err.is_internal());
    assert!(err.to_string().starts_with("internal error [E9001]: "));
}

#[test]
fn impossible_carries_span() {
    let err = CompileError::impossible("enum variant without enum", Span::new(4, 8));
    assert!(err.is_internal());
    assert_eq!(err.code(), ErrorCode::E9003);
    assert_eq!(err.diagnostic().primary_span(), Some(Span::new(4, 8)));
}
