//! Identity gate consulted before mutations.
//!
//! The core never authenticates anyone. It receives an [`Identity`] from the
//! caller (a signed-in email, a CLI flag) and asks an [`AccessGate`] whether
//! that identity may write.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Who is asking, as asserted by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decides whether an identity may mutate the store.
pub trait AccessGate: Send + Sync {
    fn is_authorized(&self, identity: &Identity) -> bool;
}

impl<F> AccessGate for F
where
    F: Fn(&Identity) -> bool + Send + Sync,
{
    fn is_authorized(&self, identity: &Identity) -> bool {
        self(identity)
    }
}

/// Exact-match allow list. An empty list admits nobody.
///
/// # Examples
///
/// ```
/// use folio_core::{AccessGate, AllowList, Identity};
///
/// let gate = AllowList::from_csv("alice@example.com, bob@example.com");
/// assert!(gate.is_authorized(&Identity::new("bob@example.com")));
/// assert!(!gate.is_authorized(&Identity::new("Bob@example.com")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    allowed: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, T>(identities: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            allowed: identities
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list such as the `ALLOWED_EMAILS` variable.
    pub fn from_csv(csv: &str) -> Self {
        Self::new(split_identities(csv))
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }
}

impl AccessGate for AllowList {
    fn is_authorized(&self, identity: &Identity) -> bool {
        !identity.as_str().is_empty() && self.allowed.contains(identity.as_str())
    }
}

/// Admits everyone. For local single-user setups and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessGate for AllowAll {
    fn is_authorized(&self, _identity: &Identity) -> bool {
        true
    }
}

/// Splits a comma-separated identity list, trimming entries and dropping empties.
pub(crate) fn split_identities(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
