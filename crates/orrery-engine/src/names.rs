//! Bidirectional name tables for configuration enums.
//!
//! Each enum lists its canonical names once in `NAMES`; lookup in both
//! directions goes through that table.

use std::fmt;

/// A closed enum with a canonical string name per variant.
pub trait NamedEnum: Copy + Eq + Sized + 'static {
    const NAMES: &'static [(Self, &'static str)];

    /// Canonical name of the variant.
    fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(v, _)| *v == self)
            .map_or("UNKNOWN", |(_, n)| n)
    }

    /// Case-insensitive lookup by name.
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(v, _)| *v)
    }

    /// All variants in table order.
    fn variants() -> impl Iterator<Item = Self> {
        Self::NAMES.iter().map(|(v, _)| *v)
    }
}

/// Error returned by `FromStr` for an unrecognised enum name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

impl UnknownName {
    pub(crate) fn new(kind: &'static str, name: &str) -> Self {
        Self { kind, name: name.to_string() }
    }
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.name)
    }
}

impl std::error::Error for UnknownName {}

/// Parses `s` through the name table of `T`.
pub(crate) fn parse_named<T: NamedEnum>(kind: &'static str, s: &str) -> Result<T, UnknownName> {
    T::from_name(s).ok_or_else(|| UnknownName::new(kind, s))
}
