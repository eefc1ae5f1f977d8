//! Singular/plural conversion for entity and entity-set names
//!
//! Service metadata commonly names a type in the singular (`Product`) and the set
//! holding it in the plural (`Products`). The pluralizer maps between the two using
//! English suffix rules plus small irregular and uncountable tables.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Converts nouns between their singular and plural forms.
///
/// Both directions are total: a word no rule applies to is returned unchanged, and
/// a word already in the target form is left alone.
pub trait Pluralizer: Send + Sync {
    fn singularize(&self, word: &str) -> String;
    fn pluralize(&self, word: &str) -> String;
}

impl<P: Pluralizer + ?Sized> Pluralizer for Arc<P> {
    fn singularize(&self, word: &str) -> String {
        (**self).singularize(word)
    }

    fn pluralize(&self, word: &str) -> String {
        (**self).pluralize(word)
    }
}

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).expect("pluralization rule is a valid regex"),
            replacement,
        })
        .collect()
}

// First matching rule wins, so more specific suffixes come first.
static PLURAL_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r"(?i)(quiz)$", "${1}zes"),
        (r"(?i)^(ox)$", "${1}en"),
        (r"(?i)^(oxen)$", "${1}"),
        (r"(?i)([ml])ouse$", "${1}ice"),
        (r"(?i)([ml])ice$", "${1}ice"),
        (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        (r"(?i)(alias|status)$", "${1}es"),
        (r"(?i)(octop|vir)us$", "${1}i"),
        (r"(?i)(octop|vir)i$", "${1}i"),
        (r"(?i)(bu)s$", "${1}ses"),
        (r"(?i)(x|ch|ss|sh)$", "${1}es"),
        (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
        (r"(?i)(hive)$", "${1}s"),
        (r"(?i)([^f])fe$", "${1}ves"),
        (r"(?i)([lr]|ea)f$", "${1}ves"),
        (r"(?i)sis$", "ses"),
        (r"(?i)([ti])a$", "${1}a"),
        (r"(?i)([ti])um$", "${1}a"),
        (r"(?i)(buffal|tomat|potat|her)o$", "${1}oes"),
        (r"(?i)s$", "s"),
        (r"$", "s"),
    ])
});

static SINGULAR_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r"(?i)(quiz)zes$", "${1}"),
        (r"(?i)^(ox)en$", "${1}"),
        (r"(?i)([ml])ice$", "${1}ouse"),
        (r"(?i)(matr)ices$", "${1}ix"),
        (r"(?i)(vert|ind)ices$", "${1}ex"),
        (r"(?i)(alias|status)(?:es)?$", "${1}"),
        (r"(?i)(octop|vir)(?:us|i)$", "${1}us"),
        (r"(?i)(bus)(?:es)?$", "${1}"),
        (r"(?i)(cris|ax|test)(?:is|es)$", "${1}is"),
        (r"(?i)(shoe)s$", "${1}"),
        (r"(?i)(o)es$", "${1}"),
        (r"(?i)(x|ch|ss|sh)es$", "${1}"),
        (r"(?i)(m)ovies$", "${1}ovie"),
        (r"(?i)([^aeiouy]|qu)ies$", "${1}y"),
        (r"(?i)([lr]|ea)ves$", "${1}f"),
        (r"(?i)(tive)s$", "${1}"),
        (r"(?i)(hive)s$", "${1}"),
        (r"(?i)([^f])ves$", "${1}fe"),
        (r"(?i)(analy|ba|diagno|parenthe|progno|synop|the)ses$", "${1}sis"),
        (r"(?i)sis$", "sis"),
        (r"(?i)([ti])a$", "${1}um"),
        (r"(?i)(ss)$", "${1}"),
        (r"(?i)s$", ""),
    ])
});

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("goose", "geese"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("zombie", "zombies"),
];

const UNCOUNTABLE: &[&str] = &[
    "aircraft",
    "deer",
    "equipment",
    "fish",
    "information",
    "money",
    "moose",
    "news",
    "police",
    "rice",
    "series",
    "sheep",
    "species",
];

/// Give `replacement` the casing style of `original` (lower, Capitalized or UPPER)
fn match_case(original: &str, replacement: &str) -> String {
    let mut chars = original.chars();
    let first_upper = chars.next().is_some_and(char::is_uppercase);
    let all_upper = first_upper
        && original.chars().count() > 1
        && original.chars().all(|c| !c.is_lowercase());

    if all_upper {
        replacement.to_uppercase()
    } else if first_upper {
        let mut out = String::with_capacity(replacement.len());
        let mut rest = replacement.chars();
        if let Some(first) = rest.next() {
            out.extend(first.to_uppercase());
        }
        out.push_str(rest.as_str());
        out
    } else {
        replacement.to_string()
    }
}

fn apply(rules: &[Rule], word: &str) -> String {
    rules
        .iter()
        .find(|rule| rule.pattern.is_match(word))
        .map(|rule| rule.pattern.replace(word, rule.replacement).into_owned())
        .unwrap_or_else(|| word.to_string())
}

/// Rule-table pluralizer for English nouns
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePluralizer;

impl SimplePluralizer {
    pub fn new() -> Self {
        Self
    }
}

impl Pluralizer for SimplePluralizer {
    fn pluralize(&self, word: &str) -> String {
        if word.is_empty() {
            return word.to_string();
        }

        let lower = word.to_lowercase();
        if UNCOUNTABLE.contains(&lower.as_str()) {
            return word.to_string();
        }

        for (singular, plural) in IRREGULAR {
            if lower == *plural {
                return word.to_string();
            }
            if lower == *singular {
                return match_case(word, plural);
            }
        }

        apply(&PLURAL_RULES, word)
    }

    fn singularize(&self, word: &str) -> String {
        if word.is_empty() {
            return word.to_string();
        }

        let lower = word.to_lowercase();
        if UNCOUNTABLE.contains(&lower.as_str()) {
            return word.to_string();
        }

        for (singular, plural) in IRREGULAR {
            if lower == *singular {
                return word.to_string();
            }
            if lower == *plural {
                return match_case(word, singular);
            }
        }

        apply(&SINGULAR_RULES, word)
    }
}

/// Memoizing decorator over any pluralizer.
///
/// The two directions are cached independently, keyed by the exact input word.
pub struct CachedPluralizer<P> {
    inner: P,
    singulars: DashMap<String, String>,
    plurals: DashMap<String, String>,
}

impl<P: Pluralizer> CachedPluralizer<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            singulars: DashMap::new(),
            plurals: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of cached (singularized, pluralized) entries
    pub fn cached_len(&self) -> (usize, usize) {
        (self.singulars.len(), self.plurals.len())
    }

    fn lookup(cache: &DashMap<String, String>, word: &str, compute: impl FnOnce() -> String) -> String {
        if let Some(cached) = cache.get(word) {
            return cached.value().clone();
        }
        cache
            .entry(word.to_string())
            .or_insert_with(compute)
            .value()
            .clone()
    }
}

impl<P: Pluralizer> Pluralizer for CachedPluralizer<P> {
    fn singularize(&self, word: &str) -> String {
        Self::lookup(&self.singulars, word, || self.inner.singularize(word))
    }

    fn pluralize(&self, word: &str) -> String {
        Self::lookup(&self.plurals, word, || self.inner.pluralize(word))
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for CachedPluralizer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedPluralizer")
            .field("inner", &self.inner)
            .field("singulars", &self.singulars.len())
            .field("plurals", &self.plurals.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pluralize(word: &str) -> String {
        SimplePluralizer.pluralize(word)
    }

    fn singularize(word: &str) -> String {
        SimplePluralizer.singularize(word)
    }

    #[test]
    fn test_regular_plurals() {
        assert_eq!(pluralize("contact"), "contacts");
        assert_eq!(pluralize("account"), "accounts");
        assert_eq!(pluralize("product"), "products");
    }

    #[test]
    fn test_s_sh_ch_x_z_endings() {
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("quiz"), "quizzes");
        assert_eq!(pluralize("bus"), "buses");
        assert_eq!(pluralize("status"), "statuses");
    }

    #[test]
    fn test_consonant_y_endings() {
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("opportunity"), "opportunities");
    }

    #[test]
    fn test_vowel_y_endings() {
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("survey"), "surveys");
    }

    #[test]
    fn test_f_fe_endings() {
        assert_eq!(pluralize("leaf"), "leaves");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("life"), "lives");
        assert_eq!(pluralize("wolf"), "wolves");
    }

    #[test]
    fn test_o_endings() {
        assert_eq!(pluralize("hero"), "heroes");
        assert_eq!(pluralize("potato"), "potatoes");
        assert_eq!(pluralize("video"), "videos");
        assert_eq!(pluralize("radio"), "radios");
    }

    #[test]
    fn test_latin_and_irregular() {
        assert_eq!(pluralize("matrix"), "matrices");
        assert_eq!(pluralize("index"), "indices");
        assert_eq!(pluralize("datum"), "data");
        assert_eq!(pluralize("analysis"), "analyses");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("Child"), "Children");
        assert_eq!(pluralize("mouse"), "mice");
        assert_eq!(pluralize("ox"), "oxen");
    }

    #[test]
    fn test_uncountable_unchanged() {
        assert_eq!(pluralize("equipment"), "equipment");
        assert_eq!(singularize("News"), "News");
        assert_eq!(pluralize("Sheep"), "Sheep");
    }

    #[test]
    fn test_prefixed_entity_names() {
        assert_eq!(pluralize("new_entity"), "new_entities");
        assert_eq!(pluralize("cgk_contact"), "cgk_contacts");
        assert_eq!(singularize("prefix_items"), "prefix_item");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("Products"), "Product");
        assert_eq!(singularize("Categories"), "Category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("Employees"), "Employee");
        assert_eq!(singularize("knives"), "knife");
        assert_eq!(singularize("leaves"), "leaf");
        assert_eq!(singularize("heroes"), "hero");
        assert_eq!(singularize("People"), "Person");
        assert_eq!(singularize("matrices"), "matrix");
        assert_eq!(singularize("movies"), "movie");
    }

    #[test]
    fn test_already_in_target_form_is_stable() {
        for word in ["Products", "Categories", "Addresses", "people", "mice", "data", "buses"] {
            assert_eq!(pluralize(word), word, "pluralize changed plural {:?}", word);
        }
        for word in ["Product", "Category", "Address", "person", "status", "bus", "analysis", "crisis"] {
            assert_eq!(singularize(word), word, "singularize changed singular {:?}", word);
        }
    }

    #[test]
    fn test_regular_nouns_round_trip() {
        for word in [
            "product", "category", "order", "box", "church", "knife", "wolf", "hero", "quiz",
            "matrix", "index", "mouse", "person", "status", "virus", "crisis", "hive", "wife",
        ] {
            assert_eq!(singularize(&pluralize(word)), word, "round trip failed for {:?}", word);
        }
    }

    #[test]
    fn test_case_is_preserved() {
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("PERSON"), "PEOPLE");
        assert_eq!(singularize("ORDERS"), "ORDER");
    }

    #[test]
    fn test_empty_word() {
        assert_eq!(pluralize(""), "");
        assert_eq!(singularize(""), "");
    }

    struct CountingPluralizer {
        calls: AtomicUsize,
    }

    impl Pluralizer for CountingPluralizer {
        fn singularize(&self, word: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SimplePluralizer.singularize(word)
        }

        fn pluralize(&self, word: &str) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SimplePluralizer.pluralize(word)
        }
    }

    #[test]
    fn test_cached_pluralizer_memoizes_each_direction() {
        let cached = CachedPluralizer::new(CountingPluralizer {
            calls: AtomicUsize::new(0),
        });

        assert_eq!(cached.pluralize("Category"), "Categories");
        assert_eq!(cached.pluralize("Category"), "Categories");
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);

        // the other direction has its own cache entry
        assert_eq!(cached.singularize("Category"), "Category");
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);

        assert_eq!(cached.cached_len(), (1, 1));
    }
}
