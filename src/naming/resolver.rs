//! Match strategies deciding whether a metadata name answers a requested name

use super::homogenize::Homogenizer;
use super::pluralization::Pluralizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix after the last `.`, or the whole name when it has no dot.
///
/// `Namespace.Entity` reduces to `Entity`, so qualified type names compare against
/// short names.
pub fn last_post_dot_segment(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// How two already-reduced names are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameComparison {
    #[default]
    CaseSensitive,
    CaseInsensitive,
}

impl NameComparison {
    pub fn equals(self, left: &str, right: &str) -> bool {
        match self {
            NameComparison::CaseSensitive => left == right,
            NameComparison::CaseInsensitive => left.to_lowercase() == right.to_lowercase(),
        }
    }
}

/// Name matching strategy.
///
/// A resolver is a plain value: pick one of the constants (or build an `Exact` with
/// explicit parameters) and share it freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MatchResolver {
    /// Equality after optional homogenization, no pluralization
    Exact {
        alphanumeric: bool,
        comparison: NameComparison,
    },
    /// Homogenized equality, falling back to singular/plural forms of either side
    BestMatch,
}

impl MatchResolver {
    pub const STRICT: MatchResolver = MatchResolver::Exact {
        alphanumeric: false,
        comparison: NameComparison::CaseSensitive,
    };

    pub const STRICT_CASE_INSENSITIVE: MatchResolver = MatchResolver::Exact {
        alphanumeric: false,
        comparison: NameComparison::CaseInsensitive,
    };

    pub const ALPHANUMERIC: MatchResolver = MatchResolver::Exact {
        alphanumeric: true,
        comparison: NameComparison::CaseSensitive,
    };

    pub const ALPHANUMERIC_CASE_INSENSITIVE: MatchResolver = MatchResolver::Exact {
        alphanumeric: true,
        comparison: NameComparison::CaseInsensitive,
    };

    pub const NOT_STRICT: MatchResolver = MatchResolver::BestMatch;

    /// Decide whether `actual` (from metadata) answers `requested` (from caller code)
    pub fn is_match(
        &self,
        homogenizer: &Homogenizer,
        pluralizer: &dyn Pluralizer,
        actual: &str,
        requested: &str,
    ) -> bool {
        let actual = last_post_dot_segment(actual);
        let requested = last_post_dot_segment(requested);

        match *self {
            MatchResolver::Exact {
                alphanumeric: true,
                comparison,
            } => comparison.equals(
                &homogenizer.homogenize(actual),
                &homogenizer.homogenize(requested),
            ),
            MatchResolver::Exact {
                alphanumeric: false,
                comparison,
            } => comparison.equals(actual, requested),
            MatchResolver::BestMatch => {
                let actual = homogenizer.homogenize(actual);
                let requested = homogenizer.homogenize(requested);

                actual == requested
                    || actual == pluralizer.singularize(&requested)
                    || actual == pluralizer.pluralize(&requested)
                    || pluralizer.singularize(&actual) == requested
                    || pluralizer.pluralize(&actual) == requested
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            MatchResolver::BestMatch => "not-strict",
            MatchResolver::Exact {
                alphanumeric: false,
                comparison: NameComparison::CaseSensitive,
            } => "strict",
            MatchResolver::Exact {
                alphanumeric: false,
                comparison: NameComparison::CaseInsensitive,
            } => "strict-case-insensitive",
            MatchResolver::Exact {
                alphanumeric: true,
                comparison: NameComparison::CaseSensitive,
            } => "alphanumeric",
            MatchResolver::Exact {
                alphanumeric: true,
                comparison: NameComparison::CaseInsensitive,
            } => "alphanumeric-case-insensitive",
        }
    }

    pub fn all() -> [MatchResolver; 5] {
        [
            MatchResolver::STRICT,
            MatchResolver::STRICT_CASE_INSENSITIVE,
            MatchResolver::ALPHANUMERIC,
            MatchResolver::ALPHANUMERIC_CASE_INSENSITIVE,
            MatchResolver::NOT_STRICT,
        ]
    }
}

impl Default for MatchResolver {
    fn default() -> Self {
        MatchResolver::NOT_STRICT
    }
}

impl fmt::Display for MatchResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatchResolver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        MatchResolver::all()
            .into_iter()
            .find(|resolver| resolver.name() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = MatchResolver::all().iter().map(|r| r.name()).collect();
                format!("Unknown resolver '{}'. Expected one of: {}", s, known.join(", "))
            })
    }
}

impl TryFrom<String> for MatchResolver {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchResolver> for String {
    fn from(resolver: MatchResolver) -> Self {
        resolver.name().to_string()
    }
}
