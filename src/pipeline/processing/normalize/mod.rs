//! Field-level canonicalization of manufacturer, model, category, and
//! equipment-type strings against the taxonomy. All functions are pure:
//! the same input and taxonomy always produce the same output.

pub mod matching;
pub mod specs;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::UNKNOWN;
use crate::taxonomy::{Taxonomy, OTHER_CATEGORY};

/// Acceptance threshold for fuzzy manufacturer matches (0-100 scale).
pub const MANUFACTURER_MATCH_THRESHOLD: f64 = 80.0;
/// Acceptance threshold for fuzzy category matches.
pub const CATEGORY_MATCH_THRESHOLD: f64 = 70.0;
/// Acceptance threshold for fuzzy equipment-type matches within a category.
pub const TYPE_MATCH_THRESHOLD: f64 = 75.0;

static CORPORATE_SUFFIXES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(inc|incorporated|corp|corporation|ltd|limited|llc)\b").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static MODEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(model\s+|mod\s+)").unwrap());
static MODEL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(series|ser)$").unwrap());
static MODEL_CHARSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s\-/]").unwrap());
static GENERIC_TYPE_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(system|device|unit|equipment)\b").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalizes the name-like fields of one raw record.
pub struct FieldNormalizer<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> FieldNormalizer<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Resolve a free-text manufacturer string to its canonical display form.
    ///
    /// Resolution order: exact alias lookup, fuzzy match against canonical
    /// names, then best-effort cleanup of the original (corporate suffixes
    /// and punctuation stripped, title-cased). Empty input and input that
    /// cleans down to nothing both resolve to "Unknown".
    pub fn normalize_manufacturer(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return UNKNOWN.to_string();
        }
        let lowered = trimmed.to_lowercase();

        for entry in self.taxonomy.manufacturers() {
            if entry.aliases.iter().any(|alias| *alias == lowered) {
                return title_case(&entry.canonical);
            }
        }

        let canonical_names = self.taxonomy.manufacturers().iter().map(|e| e.canonical.as_str());
        if let Some(name) =
            matching::best_match_over(&lowered, canonical_names, MANUFACTURER_MATCH_THRESHOLD)
        {
            return title_case(name);
        }

        let stripped = CORPORATE_SUFFIXES.replace_all(&lowered, "");
        let stripped = NON_WORD.replace_all(&stripped, "");
        let stripped = stripped.trim();
        if stripped.is_empty() {
            UNKNOWN.to_string()
        } else {
            title_case(stripped)
        }
    }

    /// Clean a model string: drop "model "/"mod " prefixes and
    /// "series"/"ser" suffixes, collapse whitespace, keep only
    /// alphanumerics, spaces, hyphens, and slashes.
    pub fn normalize_model(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return UNKNOWN.to_string();
        }
        let cleaned = MODEL_PREFIX.replace(trimmed, "");
        let cleaned = MODEL_SUFFIX.replace(&cleaned, "");
        let cleaned = WHITESPACE_RUNS.replace_all(&cleaned, " ");
        let cleaned = MODEL_CHARSET.replace_all(&cleaned, "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            UNKNOWN.to_string()
        } else {
            cleaned.to_string()
        }
    }

    /// Resolve a category, preferring the explicit category string over
    /// keyword inference from the equipment type, which in turn is preferred
    /// over a low-confidence fuzzy guess. Falls back to "other".
    pub fn normalize_category(&self, raw_category: &str, equipment_type: &str) -> String {
        let cleaned = raw_category.trim().to_lowercase();

        if self.taxonomy.is_known_category(&cleaned) {
            return cleaned;
        }

        if !equipment_type.trim().is_empty() {
            let type_lower = equipment_type.to_lowercase();
            for category in self.taxonomy.categories() {
                if category.keywords.iter().any(|kw| type_lower.contains(kw.as_str())) {
                    return category.name.clone();
                }
            }
        }

        if let Some(name) = matching::best_match_over(
            &cleaned,
            self.taxonomy.category_names(),
            CATEGORY_MATCH_THRESHOLD,
        ) {
            return name.to_string();
        }

        OTHER_CATEGORY.to_string()
    }

    /// Resolve an equipment type to the canonical display name declared for
    /// the (already resolved) category, falling back to stripping generic
    /// words and title-casing the remainder.
    pub fn normalize_equipment_type(&self, raw_type: &str, category: &str) -> String {
        let trimmed = raw_type.trim();
        if trimmed.is_empty() {
            return UNKNOWN.to_string();
        }
        let lowered = trimmed.to_lowercase();

        if let Some(aliases) = self.taxonomy.type_aliases(category) {
            if let Some(hit) = aliases.iter().find(|t| t.alias == lowered) {
                return hit.canonical.clone();
            }
            if let Some(alias) = matching::best_match_over(
                &lowered,
                aliases.iter().map(|t| t.alias.as_str()),
                TYPE_MATCH_THRESHOLD,
            ) {
                if let Some(hit) = aliases.iter().find(|t| t.alias == alias) {
                    return hit.canonical.clone();
                }
            }
        }

        let cleaned = GENERIC_TYPE_WORDS.replace_all(&lowered, "");
        let cleaned = NON_WORD.replace_all(&cleaned, " ");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            UNKNOWN.to_string()
        } else {
            title_case(cleaned)
        }
    }
}

/// Title-case each whitespace-separated word, collapsing whitespace runs.
pub(crate) fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
