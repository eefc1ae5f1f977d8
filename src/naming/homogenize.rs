//! Identifier normalization for loose name comparison
//!
//! A homogenized name is the lower-cased source with every character matched by the
//! configured pattern removed (whitespace and punctuation by default), so that
//! `Order_Details`, `order details` and `OrderDetails` all compare equal.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Characters that never take part in a name comparison
pub const DEFAULT_PATTERN: &str = r"[\s\p{P}]";

static DEFAULT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_PATTERN).expect("default homogenize pattern is valid"));

/// A normalization rule together with the results computed under it.
///
/// The two always travel together so that swapping the rule can never leave
/// entries computed by the previous rule visible to readers of the new one.
struct HomogenizeRule {
    regex: Regex,
    cache: DashMap<String, String>,
}

impl HomogenizeRule {
    fn new(regex: Regex) -> Self {
        Self {
            regex,
            cache: DashMap::new(),
        }
    }

    fn normalize(&self, source: &str) -> String {
        self.regex
            .replace_all(&source.to_lowercase(), "")
            .into_owned()
    }
}

/// Memoizing name normalizer shared by all resolvers of a matcher.
///
/// Entries are keyed by the source string compared case-insensitively. The first
/// writer for a key wins; later lookups with a different casing get the cached value
/// and are never re-normalized.
pub struct Homogenizer {
    rule: ArcSwap<HomogenizeRule>,
}

impl Homogenizer {
    /// Create a homogenizer using [`DEFAULT_PATTERN`]
    pub fn new() -> Self {
        Self::with_regex(DEFAULT_REGEX.clone())
    }

    /// Create a homogenizer from a custom pattern of characters to strip
    pub fn with_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::with_regex(Regex::new(pattern)?))
    }

    pub fn with_regex(regex: Regex) -> Self {
        Self {
            rule: ArcSwap::from_pointee(HomogenizeRule::new(regex)),
        }
    }

    /// Normalize a name, computing and caching it on first sight
    pub fn homogenize(&self, source: &str) -> String {
        let rule = self.rule.load();
        let key = source.to_lowercase();

        if let Some(cached) = rule.cache.get(&key) {
            return cached.value().clone();
        }

        rule.cache
            .entry(key)
            .or_insert_with(|| rule.normalize(source))
            .value()
            .clone()
    }

    /// Null-preserving variant: `None` passes through untouched
    pub fn homogenize_opt(&self, source: Option<&str>) -> Option<String> {
        source.map(|s| self.homogenize(s))
    }

    /// Replace the normalization rule and drop every cached result in one step
    pub fn reconfigure(&self, regex: Regex) {
        debug!(
            "Reconfiguring homogenizer: '{}' -> '{}'",
            self.rule.load().regex.as_str(),
            regex.as_str()
        );
        self.rule.store(Arc::new(HomogenizeRule::new(regex)));
    }

    /// Compile `pattern` and install it via [`Homogenizer::reconfigure`]
    pub fn set_pattern(&self, pattern: &str) -> Result<(), regex::Error> {
        let regex = Regex::new(pattern)?;
        self.reconfigure(regex);
        Ok(())
    }

    /// Restore the default pattern with an empty cache
    pub fn reset(&self) {
        self.reconfigure(DEFAULT_REGEX.clone());
    }

    /// The pattern currently in effect
    pub fn pattern(&self) -> String {
        self.rule.load().regex.as_str().to_string()
    }

    /// Number of distinct (case-insensitive) names normalized under the current rule
    pub fn cached_len(&self) -> usize {
        self.rule.load().cache.len()
    }
}

impl Default for Homogenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Homogenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.rule.load();
        f.debug_struct("Homogenizer")
            .field("pattern", &rule.regex.as_str())
            .field("cached", &rule.cache.len())
            .finish()
    }
}
