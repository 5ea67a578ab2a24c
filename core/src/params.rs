//! Query parameter normalization.
//!
//! Callers hand parameters to the ledger either as a flat list of alternating
//! name/value tokens (`["page", "2", "sort", "asc"]`) or as a ready-made
//! [`Params`] mapping. Both shapes end up as a `Params` before anything is
//! dispatched.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// A flat parameter list had an odd number of tokens.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unbalanced parameters: expected name/value pairs, got {count} tokens")]
pub struct UnbalancedParameters {
    /// Number of tokens supplied
    pub count: usize,
}

/// Ordered name → value mapping.
///
/// Names keep the position of their first insertion; inserting an existing
/// name overwrites its value in place. Serializes as a sequence of
/// `(name, value)` pairs, which is the shape query-string encoders expect.
/// Deserializing goes through [`Params::insert`], so repeated names collapse
/// the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Create an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Set `name` to `value`. Returns the previous value if the name was present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        if let Some((_, existing)) = self.pairs.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(existing, value));
        }
        self.pairs.push((name, value));
        None
    }

    /// Look up the value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate `(name, value)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Borrow the underlying pairs.
    #[must_use]
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Build a mapping from a flat name/value token list.
    ///
    /// # Errors
    ///
    /// Returns [`UnbalancedParameters`] if the list has an odd length.
    pub fn from_flat<I, S>(tokens: I) -> Result<Self, UnbalancedParameters>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.len() % 2 != 0 {
            return Err(UnbalancedParameters {
                count: tokens.len(),
            });
        }

        let mut params = Self::new();
        let mut tokens = tokens.into_iter();
        while let (Some(name), Some(value)) = (tokens.next(), tokens.next()) {
            params.insert(name, value);
        }
        Ok(params)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<(String, String)>::deserialize(deserializer).map(|pairs| pairs.into_iter().collect())
    }
}

/// Parameters as supplied by a caller, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamArgs {
    /// Alternating name/value tokens. Must have even length.
    Flat(Vec<String>),
    /// A pre-built mapping.
    Mapping(Params),
}

impl ParamArgs {
    /// No parameters.
    #[must_use]
    pub const fn none() -> Self {
        Self::Mapping(Params::new())
    }

    /// Turn the arguments into a [`Params`] mapping.
    ///
    /// # Errors
    ///
    /// Returns [`UnbalancedParameters`] for an odd-length flat list.
    pub fn normalize(self) -> Result<Params, UnbalancedParameters> {
        match self {
            Self::Flat(tokens) => Params::from_flat(tokens),
            Self::Mapping(params) => Ok(params),
        }
    }
}

impl Default for ParamArgs {
    fn default() -> Self {
        Self::none()
    }
}

impl From<Params> for ParamArgs {
    fn from(params: Params) -> Self {
        Self::Mapping(params)
    }
}

impl From<Vec<String>> for ParamArgs {
    fn from(tokens: Vec<String>) -> Self {
        Self::Flat(tokens)
    }
}

impl From<Vec<&str>> for ParamArgs {
    fn from(tokens: Vec<&str>) -> Self {
        Self::Flat(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ParamArgs {
    fn from(tokens: &[&str]) -> Self {
        Self::Flat(tokens.iter().map(|t| (*t).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamArgs {
    fn from(tokens: [&str; N]) -> Self {
        Self::Flat(tokens.iter().map(|t| (*t).to_string()).collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<HashMap<K, V>> for ParamArgs {
    fn from(map: HashMap<K, V>) -> Self {
        Self::Mapping(map.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for ParamArgs {
    fn from(map: BTreeMap<K, V>) -> Self {
        Self::Mapping(map.into_iter().collect())
    }
}

/// Build a flat [`ParamArgs`] from name/value tokens of any `ToString` type.
///
/// Balance is checked when the ledger normalizes the list, so an odd token
/// count surfaces as `LedgerError::UnbalancedParameters` at dispatch.
///
/// # Example
///
/// ```
/// use request_ledger_core::params;
///
/// let args = params!["page", 2, "sort", "asc"];
/// let params = args.normalize().unwrap_or_default();
/// assert_eq!(params.get("page"), Some("2"));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::params::ParamArgs::none()
    };
    ($($token:expr),+ $(,)?) => {
        $crate::params::ParamArgs::Flat(::std::vec![$(::std::string::ToString::to_string(&$token)),+])
    };
}
