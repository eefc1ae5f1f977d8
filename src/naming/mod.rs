//! Schema name resolution
//!
//! Reconciles names used by application code with the names present in service
//! metadata: exact, normalized, and singular/plural-tolerant matching.

pub mod homogenize;
pub mod matcher;
pub mod pluralization;
pub mod resolver;

pub use homogenize::{DEFAULT_PATTERN, Homogenizer};
pub use matcher::{SchemaNameMatcher, UnresolvableName};
pub use pluralization::{CachedPluralizer, Pluralizer, SimplePluralizer};
pub use resolver::{MatchResolver, NameComparison, last_post_dot_segment};
