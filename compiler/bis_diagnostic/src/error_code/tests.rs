use super::*;
use pretty_assertions::assert_eq;

#[test]
fn as_str_matches_variant() {
    assert_eq!(ErrorCode::E3012.as_str(), "E3012");
    assert_eq!(ErrorCode::E9002.to_string(), "E9002");
}

#[test]
fn phase_follows_first_digit() {
    for code in ErrorCode::ALL {
        let expected = match code.as_str().as_bytes()[1] {
            b'1' => Phase::Scope,
            b'2' => Phase::Kind,
            b'3' => Phase::Type,
            b'4' => Phase::Instance,
            b'5' => Phase::ControlFlow,
            b'6' => Phase::Unimplemented,
            b'9' => Phase::Internal,
            other => panic!("unexpected phase digit {}", other as char),
        };
        assert_eq!(code.phase(), expected, "{code}");
    }
}

#[test]
fn only_e9_codes_are_internal() {
    assert!(ErrorCode::E9001.is_internal_error());
    assert!(ErrorCode::E9003.is_internal_error());
    assert!(!ErrorCode::E4002.is_internal_error());
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!("e4001".parse::<ErrorCode>(), Ok(ErrorCode::E4001));
    assert_eq!("E5002".parse::<ErrorCode>(), Ok(ErrorCode::E5002));
    assert_eq!("E0000".parse::<ErrorCode>(), Err(()));
}

#[test]
fn descriptions_are_trimmed() {
    assert_eq!(ErrorCode::E1001.description(), "Name is not in scope");
    for code in ErrorCode::ALL {
        assert!(!code.description().is_empty(), "{code} has no description");
    }
}
