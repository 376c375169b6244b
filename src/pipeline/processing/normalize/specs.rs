//! Specification key/value canonicalization. Keys are folded onto the
//! taxonomy's synonym table; values get unit-aware rewrites for the keys
//! where units commonly vary (power, weight, frequency response) and pass
//! through trimmed everywhere else.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::taxonomy::Taxonomy;

const POUNDS_PER_KILOGRAM: f64 = 0.453592;

static SPEC_KEY_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static SPEC_KEY_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static POWER_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(w|watts?|kw)").unwrap());
static WEIGHT_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(kg|lbs?|pounds?)").unwrap());
static FREQUENCY_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:hz)?\s*-\s*(\d+(?:\.\d+)?)\s*(khz|hz)").unwrap());

/// Canonicalizes specification key/value pairs of one record.
pub struct SpecNormalizer<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> SpecNormalizer<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Canonicalize every pair of a record's specification map.
    pub fn normalize_specifications(
        &self,
        specifications: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        specifications
            .iter()
            .map(|(key, value)| {
                let key = self.normalize_key(key);
                let value = self.normalize_value(value, &key);
                (key, value)
            })
            .collect()
    }

    /// Fold a free-text key onto the synonym table; unmatched keys are
    /// lowercased with punctuation and whitespace runs turned into
    /// underscores and kept verbatim.
    pub fn normalize_key(&self, raw: &str) -> String {
        let cleaned = raw.trim().to_lowercase();
        if cleaned.is_empty() {
            return "unknown".to_string();
        }

        for entry in self.taxonomy.spec_keys() {
            if entry.aliases.iter().any(|alias| *alias == cleaned) {
                return entry.canonical.clone();
            }
        }

        let cleaned = SPEC_KEY_PUNCT.replace_all(&cleaned, "_");
        let cleaned = SPEC_KEY_SPACES.replace_all(&cleaned, "_");
        cleaned.into_owned()
    }

    /// Canonicalize a value for an already-canonical key. Unparseable values
    /// pass through trimmed; an empty value stays empty ("not observed" is
    /// meaningful and distinct from "Unknown").
    pub fn normalize_value(&self, raw: &str, key: &str) -> String {
        let value = raw.trim();
        if value.is_empty() {
            return String::new();
        }

        match key {
            "power" => normalize_power(value),
            "weight" => normalize_weight(value),
            "frequency_response" => normalize_frequency_response(value),
            _ => value.to_string(),
        }
    }
}

/// Rewrite watt/kilowatt readings as `"<n>W"`, converting kW to W.
fn normalize_power(value: &str) -> String {
    if let Some(caps) = POWER_VALUE.captures(value) {
        if let Ok(mut watts) = caps[1].parse::<f64>() {
            if caps[2].to_lowercase().starts_with("kw") {
                watts *= 1000.0;
            }
            return format!("{}W", format_float(watts));
        }
    }
    value.to_string()
}

/// Rewrite kg/lb readings as `"<n, one decimal>kg"`, converting pounds.
fn normalize_weight(value: &str) -> String {
    if let Some(caps) = WEIGHT_VALUE.captures(value) {
        if let Ok(mut kilograms) = caps[1].parse::<f64>() {
            let unit = caps[2].to_lowercase();
            if unit.starts_with("lb") || unit.starts_with("pound") {
                kilograms *= POUNDS_PER_KILOGRAM;
            }
            return format!("{kilograms:.1}kg");
        }
    }
    value.to_string()
}

/// Rewrite frequency ranges as `"<low>Hz - <high>Hz"` with integer bounds,
/// scaling a kHz upper bound to Hz.
fn normalize_frequency_response(value: &str) -> String {
    if let Some(caps) = FREQUENCY_VALUE.captures(value) {
        let low = caps[1].parse::<i64>();
        let high = caps[2].parse::<f64>();
        if let (Ok(low), Ok(mut high)) = (low, high) {
            if caps[3].to_lowercase().starts_with('k') {
                high *= 1000.0;
            }
            return format!("{}Hz - {}Hz", low, high as i64);
        }
    }
    value.to_string()
}

/// Render a float the way the downstream contract expects: always with a
/// fractional part ("2200.0", "1.5"), never in exponent form for the
/// magnitudes seen here.
fn format_float(value: f64) -> String {
    format!("{value:?}")
}
