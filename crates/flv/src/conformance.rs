use std::fmt::Debug;

use tracing::warn;

use crate::config::FlvParserConfig;
use crate::error::FlvError;

/// Applies the strictness policy to container checks and counts the warnings
/// issued while parsing.
#[derive(Debug, Clone, Default)]
pub struct Conformance {
    strict: bool,
    warnings: usize,
}

impl Conformance {
    pub fn new(config: &FlvParserConfig) -> Self {
        Self {
            strict: config.strict,
            warnings: 0,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Number of warnings issued so far.
    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Checks that `actual == expected`.
    ///
    /// Under strict parsing a mismatch is a `MalformedContainer` error. Otherwise
    /// it is logged and counted, and the caller carries on with `actual`.
    pub fn ensure<T>(
        &mut self,
        actual: T,
        expected: T,
        message: impl FnOnce() -> String,
    ) -> Result<(), FlvError>
    where
        T: PartialEq + Debug,
    {
        if actual == expected {
            return Ok(());
        }

        let message = message();
        if self.strict {
            return Err(FlvError::MalformedContainer(message));
        }

        warn!(?actual, ?expected, "Skipping non-conformant value in FLV file: {}", message);
        self.warnings += 1;
        Ok(())
    }

    /// Fails under strict parsing, does nothing otherwise. Used for
    /// enumerated fields that lenient parsing accepts silently.
    pub fn check_strict(
        &self,
        valid: bool,
        message: impl FnOnce() -> String,
    ) -> Result<(), FlvError> {
        if self.strict && !valid {
            return Err(FlvError::MalformedContainer(message()));
        }
        Ok(())
    }

    /// Logs and counts a warning regardless of strictness.
    pub fn warn(&mut self, message: impl AsRef<str>) {
        warn!("{}", message.as_ref());
        self.warnings += 1;
    }
}
