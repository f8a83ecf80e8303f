//! Driver configuration.

/// Environment variable overriding [`CompileOptions::entry`].
pub const ENTRY_VAR: &str = "BISC_ENTRY";
/// Environment variable enabling [`CompileOptions::check_only`].
pub const CHECK_ONLY_VAR: &str = "BISC_CHECK_ONLY";

/// How [`compile`](crate::compile) runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name of the function recorded as the module's entry point.
    pub entry: String,
    /// Fail with E1005 when the program does not define `entry`.
    pub require_entry: bool,
    /// Stop after the checking passes; no module is produced.
    pub check_only: bool,
    /// Install the tracing subscriber before compiling.
    pub tracing: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            entry: "main".to_owned(),
            require_entry: false,
            check_only: false,
            tracing: false,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `BISC_ENTRY` and `BISC_CHECK_ONLY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the driver's
    /// environment variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(entry) = lookup(ENTRY_VAR).filter(|e| !e.trim().is_empty()) {
            options.entry = entry.trim().to_owned();
        }
        if let Some(flag) = lookup(CHECK_ONLY_VAR) {
            options.check_only = is_truthy(&flag);
        }
        options
    }

    #[must_use]
    pub fn entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    #[must_use]
    pub fn require_entry(mut self, require: bool) -> Self {
        self.require_entry = require;
        self
    }

    #[must_use]
    pub fn check_only(mut self, check_only: bool) -> Self {
        self.check_only = check_only;
        self
    }

    #[must_use]
    pub fn tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
