//! Error codes for all compiler diagnostics.
//!
//! Each code is a unique identifier (e.g. `E3012`) whose first digit names
//! the category of the problem. Codes are stable: tests and tooling match
//! on them instead of on message text.

use std::fmt;

/// Category of a diagnostic, taken from the first digit of its code.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Phase {
    /// E1xxx: unresolved names and redeclarations.
    Scope,
    /// E2xxx: things used as types, arity, constraints.
    Kind,
    /// E3xxx: type mismatches and inference failures.
    Type,
    /// E4xxx: interface instances and evidence.
    Instance,
    /// E5xxx: reachability and loop control.
    ControlFlow,
    /// E6xxx: recognised but unimplemented constructs.
    Unimplemented,
    /// E9xxx: internal compiler errors.
    Internal,
}

macro_rules! error_codes {
    ($( $(#[doc = $doc:literal])* $code:ident => $phase:ident, )*) => {
        /// Error codes for all compiler diagnostics.
        ///
        /// Format: E#### where the first digit is the [`Phase`].
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub enum ErrorCode {
            $( $(#[doc = $doc])* $code, )*
        }

        impl ErrorCode {
            /// Every code, in numeric order.
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$code, )* ];

            /// The code as text, e.g. `"E3012"`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ErrorCode::$code => stringify!($code), )*
                }
            }

            pub fn phase(&self) -> Phase {
                match self {
                    $( ErrorCode::$code => Phase::$phase, )*
                }
            }

            /// One-line description used by `--explain` style listings.
            pub fn description(&self) -> &'static str {
                match self {
                    $( ErrorCode::$code => concat!($($doc),*).trim_ascii(), )*
                }
            }
        }
    };
}

error_codes! {
    // Scope errors (E1xxx)
    /// Name is not in scope
    E1001 => Scope,
    /// Name declared twice in the same scope
    E1002 => Scope,
    /// Duplicate entry in a generic, parameter, field, variant or method list
    E1003 => Scope,
    /// `self` type used outside an interface
    E1004 => Scope,
    /// Required entry point function is not defined
    E1005 => Scope,

    // Kind and arity errors (E2xxx)
    /// Name does not refer to a type
    E2001 => Kind,
    /// Wrong number of type arguments
    E2002 => Kind,
    /// Constraint does not name an interface
    E2003 => Kind,
    /// Name does not refer to a value
    E2004 => Kind,
    /// Instance target is not a struct, enum or builtin type
    E2005 => Kind,

    // Type errors (E3xxx)
    /// Declared and actual types differ
    E3001 => Type,
    /// Argument type does not match the callee's parameter type
    E3002 => Type,
    /// Call result does not match the expected type
    E3003 => Type,
    /// Generic parameter cannot be inferred
    E3004 => Type,
    /// Generic parameter inferred as two different types
    E3005 => Type,
    /// Called value is not a function
    E3006 => Type,
    /// Wrong number of call arguments
    E3007 => Type,
    /// Effect marker `!` missing or superfluous
    E3008 => Type,
    /// Empty array literal without an expected array type
    E3009 => Type,
    /// Array literal elements have different types
    E3010 => Type,
    /// Struct literal names an unknown, duplicate or missing field
    E3011 => Type,
    /// Struct literal field has the wrong type
    E3012 => Type,
    /// Field access on a non-struct or unknown field
    E3013 => Type,
    /// Condition is not `Bool`
    E3014 => Type,
    /// Return value missing or not allowed
    E3015 => Type,
    /// Invalid match scrutinee, arm or binder
    E3016 => Type,
    /// Expression cannot be assigned to
    E3017 => Type,
    /// Invalid enum variant construction
    E3018 => Type,

    // Instance errors (E4xxx)
    /// No instance of the interface for the type
    E4001 => Instance,
    /// Second instance of an interface for the same type
    E4002 => Instance,
    /// Instance method signature differs from the interface
    E4003 => Instance,
    /// Instance methods do not match the interface's count or order
    E4004 => Instance,

    // Control-flow errors (E5xxx)
    /// Function with a return type may reach its end
    E5001 => ControlFlow,
    /// Statement can never execute
    E5002 => ControlFlow,
    /// `break` outside a loop
    E5003 => ControlFlow,
    /// `continue` outside a loop
    E5004 => ControlFlow,

    // Unimplemented constructs (E6xxx)
    /// Language construct is not implemented
    E6001 => Unimplemented,

    // Internal errors (E9xxx)
    /// Handle does not refer to a node in the store
    E9001 => Internal,
    /// Attribute depends on itself
    E9002 => Internal,
    /// Impossible state reached
    E9003 => Internal,
}

impl ErrorCode {
    /// Check if this is an internal compiler error (E9xxx range).
    pub fn is_internal_error(&self) -> bool {
        self.phase() == Phase::Internal
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse an error code string like `"E3012"`. Case-insensitive.
impl std::str::FromStr for ErrorCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_uppercase();
        Self::ALL
            .iter()
            .find(|code| code.as_str() == upper)
            .copied()
            .ok_or(())
    }
}

#[cfg(test)]
mod tests;
