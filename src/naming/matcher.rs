//! Composition root for name resolution: one resolver plus the caches it consults

use super::homogenize::Homogenizer;
use super::pluralization::{CachedPluralizer, Pluralizer, SimplePluralizer};
use super::resolver::{MatchResolver, last_post_dot_segment};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use log::debug;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

const MAX_SUGGESTIONS: usize = 3;

/// No candidate answered a requested name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No schema name matches '{requested}'{}", format_suggestions(.suggestions))]
pub struct UnresolvableName {
    pub requested: String,
    pub suggestions: Vec<String>,
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Resolves requested names against the names a service's metadata exposes.
///
/// Clones share the same homogenizer and pluralizer caches.
#[derive(Clone)]
pub struct SchemaNameMatcher {
    resolver: MatchResolver,
    homogenizer: Arc<Homogenizer>,
    pluralizer: Arc<dyn Pluralizer>,
}

impl SchemaNameMatcher {
    /// Matcher with a default homogenizer and a cached English pluralizer
    pub fn new(resolver: MatchResolver) -> Self {
        Self::with_parts(
            resolver,
            Arc::new(Homogenizer::new()),
            Arc::new(CachedPluralizer::new(SimplePluralizer::new())),
        )
    }

    pub fn with_parts(
        resolver: MatchResolver,
        homogenizer: Arc<Homogenizer>,
        pluralizer: Arc<dyn Pluralizer>,
    ) -> Self {
        Self {
            resolver,
            homogenizer,
            pluralizer,
        }
    }

    /// Same caches, different strategy
    pub fn with_resolver(&self, resolver: MatchResolver) -> Self {
        Self {
            resolver,
            homogenizer: self.homogenizer.clone(),
            pluralizer: self.pluralizer.clone(),
        }
    }

    pub fn resolver(&self) -> MatchResolver {
        self.resolver
    }

    pub fn homogenizer(&self) -> &Arc<Homogenizer> {
        &self.homogenizer
    }

    pub fn pluralizer(&self) -> &Arc<dyn Pluralizer> {
        &self.pluralizer
    }

    pub fn is_match(&self, actual: &str, requested: &str) -> bool {
        self.resolver.is_match(
            &self.homogenizer,
            self.pluralizer.as_ref(),
            actual,
            requested,
        )
    }

    /// First candidate (in iteration order) that answers `requested`
    pub fn find<'a, S: AsRef<str>>(&self, candidates: &'a [S], requested: &str) -> Option<&'a str> {
        candidates
            .iter()
            .map(AsRef::as_ref)
            .find(|actual| self.is_match(actual, requested))
    }

    /// Like [`SchemaNameMatcher::find`], but explains a miss with the closest candidates
    pub fn resolve<'a, S: AsRef<str>>(
        &self,
        candidates: &'a [S],
        requested: &str,
    ) -> Result<&'a str, UnresolvableName> {
        if let Some(found) = self.find(candidates, requested) {
            debug!("Resolved '{}' to '{}' using {} resolver", requested, found, self.resolver);
            return Ok(found);
        }

        let suggestions = self.suggest(candidates, requested);
        debug!(
            "Could not resolve '{}' among {} candidates ({} suggestions)",
            requested,
            candidates.len(),
            suggestions.len()
        );

        Err(UnresolvableName {
            requested: requested.to_string(),
            suggestions,
        })
    }

    fn suggest<S: AsRef<str>>(&self, candidates: &[S], requested: &str) -> Vec<String> {
        let needle = self.homogenizer.homogenize(last_post_dot_segment(requested));
        if needle.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(&str, i64)> = candidates
            .iter()
            .map(AsRef::as_ref)
            .filter_map(|candidate| {
                let haystack = self.homogenizer.homogenize(last_post_dot_segment(candidate));
                matcher
                    .fuzzy_match(&haystack, &needle)
                    .or_else(|| matcher.fuzzy_match(&needle, &haystack))
                    .map(|score| (candidate, score))
            })
            .collect();

        // Highest score first; stable sort keeps candidate order among ties
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(candidate, _)| candidate.to_string())
            .collect()
    }
}

impl Default for SchemaNameMatcher {
    fn default() -> Self {
        Self::new(MatchResolver::default())
    }
}

impl fmt::Debug for SchemaNameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNameMatcher")
            .field("resolver", &self.resolver)
            .field("homogenizer", &self.homogenizer)
            .finish_non_exhaustive()
    }
}
