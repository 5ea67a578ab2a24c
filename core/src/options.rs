//! Ledger options.

use serde::{Deserialize, Serialize};

/// Options controlling ledger behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOptions {
    /// When set, a transport failure also fails the dispatch call that caused
    /// it. The failure is recorded for [`Ledger::error`](crate::Ledger::error)
    /// regardless.
    pub throw_on_failure: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            throw_on_failure: true,
        }
    }
}

impl LedgerOptions {
    /// Shallow-merge a patch into these options.
    ///
    /// An empty patch resets to [`LedgerOptions::default`].
    pub fn apply(&mut self, patch: &OptionsPatch) {
        if patch.is_empty() {
            *self = Self::default();
            return;
        }
        if let Some(throw_on_failure) = patch.throw_on_failure {
            self.throw_on_failure = throw_on_failure;
        }
    }
}

/// Partial update for [`LedgerOptions`].
///
/// Fields left as `None` keep their current value. Deserializing ignores
/// unknown keys, so a patch built from a wider settings object only picks up
/// the options the ledger knows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsPatch {
    /// New value for [`LedgerOptions::throw_on_failure`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throw_on_failure: Option<bool>,
}

impl OptionsPatch {
    /// An empty patch. Applying it resets options to their defaults.
    #[must_use]
    pub const fn reset() -> Self {
        Self {
            throw_on_failure: None,
        }
    }

    /// Set `throw_on_failure`.
    #[must_use]
    pub const fn throw_on_failure(mut self, value: bool) -> Self {
        self.throw_on_failure = Some(value);
        self
    }

    /// Check if the patch sets nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.throw_on_failure.is_none()
    }
}
