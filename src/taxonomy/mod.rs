//! Immutable reference data for canonicalization: category keyword sets,
//! manufacturer aliases, per-category equipment-type aliases, and
//! specification-key synonyms. Loaded once at startup and passed by shared
//! reference into every normalizer; two runs against the same taxonomy make
//! identical decisions for identical input.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CatalogError, Result};

/// Fallback category for records no fixed category claims.
pub const OTHER_CATEGORY: &str = "other";

/// The fixed category vocabulary, in declaration order. The order is part of
/// the contract: keyword inference scans categories in this order and the
/// first keyword hit wins.
pub const CATEGORY_ORDER: [&str; 3] = ["lighting", "sound", "video"];

/// One fixed category and the lowercase substrings that mark an equipment
/// type as belonging to it.
#[derive(Debug, Clone)]
pub struct CategoryKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

/// A canonical manufacturer name and the lowercase spellings observed for it.
#[derive(Debug, Clone)]
pub struct ManufacturerEntry {
    pub canonical: String,
    pub aliases: Vec<String>,
}

/// Maps one lowercase equipment-type spelling to its canonical display name.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub alias: String,
    pub canonical: String,
}

/// A canonical specification key and its lowercase synonyms.
#[derive(Debug, Clone)]
pub struct SpecKeyEntry {
    pub canonical: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<CategoryKeywords>,
    manufacturers: Vec<ManufacturerEntry>,
    equipment_types: Vec<(String, Vec<TypeAlias>)>,
    spec_keys: Vec<SpecKeyEntry>,
}

/// On-disk taxonomy shape (TOML).
#[derive(Debug, Deserialize)]
struct TaxonomyFile {
    categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    manufacturers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    equipment_types: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    spec_keys: BTreeMap<String, Vec<String>>,
}

impl Taxonomy {
    /// Load a taxonomy from a TOML file. Any fault in the reference data is
    /// fatal: no pipeline run may proceed on partial or ambiguous data.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Taxonomy(format!(
                "failed to read taxonomy file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TaxonomyFile = toml::from_str(content)?;

        // The category vocabulary is fixed; a file may tune keywords but not
        // invent categories. Scan order stays the declared contract order.
        let mut categories = Vec::with_capacity(CATEGORY_ORDER.len());
        for name in CATEGORY_ORDER {
            let keywords = file.categories.get(name).ok_or_else(|| {
                CatalogError::Taxonomy(format!("missing keyword set for category '{name}'"))
            })?;
            categories.push(CategoryKeywords {
                name: name.to_string(),
                keywords: keywords.iter().map(|k| k.trim().to_lowercase()).collect(),
            });
        }
        for name in file.categories.keys() {
            if !CATEGORY_ORDER.contains(&name.as_str()) {
                return Err(CatalogError::Taxonomy(format!(
                    "unknown category '{name}' (expected one of {CATEGORY_ORDER:?})"
                )));
            }
        }

        // BTreeMap iteration pins alphabetical order for file-loaded entries.
        let manufacturers = file
            .manufacturers
            .into_iter()
            .map(|(canonical, aliases)| ManufacturerEntry {
                canonical: canonical.trim().to_lowercase(),
                aliases: aliases.iter().map(|a| a.trim().to_lowercase()).collect(),
            })
            .collect();

        let equipment_types = file
            .equipment_types
            .into_iter()
            .map(|(category, aliases)| {
                (
                    category,
                    aliases
                        .into_iter()
                        .map(|(alias, canonical)| TypeAlias {
                            alias: alias.trim().to_lowercase(),
                            canonical,
                        })
                        .collect(),
                )
            })
            .collect();

        let spec_keys = file
            .spec_keys
            .into_iter()
            .map(|(canonical, aliases)| SpecKeyEntry {
                canonical,
                aliases: aliases.iter().map(|a| a.trim().to_lowercase()).collect(),
            })
            .collect();

        Self::from_parts(categories, manufacturers, equipment_types, spec_keys)
    }

    /// Assemble and validate a taxonomy from its parts. Iteration order of
    /// every collection is preserved as given and drives fuzzy-match
    /// tie-breaking, so callers must pass deterministically ordered data.
    pub fn from_parts(
        categories: Vec<CategoryKeywords>,
        manufacturers: Vec<ManufacturerEntry>,
        equipment_types: Vec<(String, Vec<TypeAlias>)>,
        spec_keys: Vec<SpecKeyEntry>,
    ) -> Result<Self> {
        let taxonomy = Self {
            categories,
            manufacturers,
            equipment_types,
            spec_keys,
        };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    fn validate(&self) -> Result<()> {
        for category in &self.categories {
            if category.keywords.iter().any(|k| k.is_empty()) {
                return Err(CatalogError::Taxonomy(format!(
                    "category '{}' contains an empty keyword",
                    category.name
                )));
            }
        }

        let mut seen_aliases: BTreeMap<&str, &str> = BTreeMap::new();
        for entry in &self.manufacturers {
            if entry.canonical.is_empty() {
                return Err(CatalogError::Taxonomy(
                    "manufacturer with empty canonical name".to_string(),
                ));
            }
            for alias in &entry.aliases {
                if alias.is_empty() {
                    return Err(CatalogError::Taxonomy(format!(
                        "manufacturer '{}' has an empty alias",
                        entry.canonical
                    )));
                }
                if let Some(owner) = seen_aliases.insert(alias, &entry.canonical) {
                    if owner != entry.canonical {
                        return Err(CatalogError::Taxonomy(format!(
                            "alias '{}' claimed by both '{}' and '{}'",
                            alias, owner, entry.canonical
                        )));
                    }
                }
            }
        }

        for (category, aliases) in &self.equipment_types {
            if !self.is_known_category(category) {
                return Err(CatalogError::Taxonomy(format!(
                    "equipment-type aliases declared for unknown category '{category}'"
                )));
            }
            if aliases
                .iter()
                .any(|t| t.alias.is_empty() || t.canonical.is_empty())
            {
                return Err(CatalogError::Taxonomy(format!(
                    "category '{category}' contains an empty equipment-type alias"
                )));
            }
        }

        let mut seen_keys: BTreeMap<&str, &str> = BTreeMap::new();
        for entry in &self.spec_keys {
            for alias in &entry.aliases {
                if alias.is_empty() {
                    return Err(CatalogError::Taxonomy(format!(
                        "specification key '{}' has an empty synonym",
                        entry.canonical
                    )));
                }
                if let Some(owner) = seen_keys.insert(alias, &entry.canonical) {
                    if owner != entry.canonical {
                        return Err(CatalogError::Taxonomy(format!(
                            "specification synonym '{}' claimed by both '{}' and '{}'",
                            alias, owner, entry.canonical
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn categories(&self) -> &[CategoryKeywords] {
        &self.categories
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn is_known_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    pub fn manufacturers(&self) -> &[ManufacturerEntry] {
        &self.manufacturers
    }

    pub fn type_aliases(&self, category: &str) -> Option<&[TypeAlias]> {
        self.equipment_types
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, aliases)| aliases.as_slice())
    }

    pub fn spec_keys(&self) -> &[SpecKeyEntry] {
        &self.spec_keys
    }

    /// The built-in reference data shipped with the tool.
    pub fn builtin() -> Self {
        Self {
            categories: builtin_categories(),
            manufacturers: builtin_manufacturers(),
            equipment_types: builtin_equipment_types(),
            spec_keys: builtin_spec_keys(),
        }
    }
}

fn keywords(name: &str, words: &[&str]) -> CategoryKeywords {
    CategoryKeywords {
        name: name.to_string(),
        keywords: words.iter().map(|w| w.to_string()).collect(),
    }
}

fn builtin_categories() -> Vec<CategoryKeywords> {
    vec![
        keywords(
            "lighting",
            &[
                "light", "lighting", "led", "fixture", "dimmer", "console", "spotlight",
                "floodlight", "par", "fresnel", "moving head", "wash", "beam", "strobe",
                "haze", "fog", "smoke", "gobo", "color changer", "scroller",
            ],
        ),
        keywords(
            "sound",
            &[
                "audio", "sound", "speaker", "microphone", "mic", "mixer", "amplifier",
                "amp", "subwoofer", "monitor", "pa", "system", "wireless", "di box",
                "compressor", "equalizer", "reverb", "delay", "console", "board",
            ],
        ),
        keywords(
            "video",
            &[
                "video", "projector", "screen", "display", "monitor", "camera", "switcher",
                "scaler", "converter", "splitter", "matrix", "recorder", "player",
                "led wall", "panel", "processor", "hdmi", "sdi", "streaming",
            ],
        ),
    ]
}

fn manufacturer(canonical: &str, aliases: &[&str]) -> ManufacturerEntry {
    ManufacturerEntry {
        canonical: canonical.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn builtin_manufacturers() -> Vec<ManufacturerEntry> {
    vec![
        manufacturer("shure", &["shure", "shure inc", "shure incorporated"]),
        manufacturer("yamaha", &["yamaha", "yamaha corporation", "yamaha music"]),
        manufacturer("qsc", &["qsc", "qsc audio", "qsc llc"]),
        manufacturer("jbl", &["jbl", "jbl professional", "harman jbl"]),
        manufacturer("martin", &["martin", "martin professional", "martin lighting"]),
        manufacturer("chamsys", &["chamsys", "chamsys ltd"]),
        manufacturer(
            "etc",
            &[
                "etc",
                "electronic theatre controls",
                "electronic theater controls",
            ],
        ),
        manufacturer("sony", &["sony", "sony corporation", "sony professional"]),
        manufacturer("panasonic", &["panasonic", "panasonic corporation"]),
        manufacturer("barco", &["barco", "barco nv"]),
        manufacturer("christie", &["christie", "christie digital"]),
        manufacturer("epson", &["epson", "seiko epson"]),
        manufacturer("avolites", &["avolites", "avolites ltd"]),
        manufacturer("robe", &["robe", "robe lighting"]),
        manufacturer("clay paky", &["clay paky", "claypaky", "clay-paky"]),
    ]
}

fn type_aliases(pairs: &[(&str, &str)]) -> Vec<TypeAlias> {
    pairs
        .iter()
        .map(|(alias, canonical)| TypeAlias {
            alias: alias.to_string(),
            canonical: canonical.to_string(),
        })
        .collect()
}

fn builtin_equipment_types() -> Vec<(String, Vec<TypeAlias>)> {
    vec![
        (
            "lighting".to_string(),
            type_aliases(&[
                ("led fixture", "LED Fixture"),
                ("led light", "LED Fixture"),
                ("moving head", "Moving Head"),
                ("moving light", "Moving Head"),
                ("par can", "PAR Can"),
                ("par light", "PAR Can"),
                ("spotlight", "Spotlight"),
                ("floodlight", "Floodlight"),
                ("fresnel", "Fresnel"),
                ("wash light", "Wash Light"),
                ("beam light", "Beam Light"),
                ("strobe", "Strobe"),
                ("dimmer", "Dimmer"),
                ("lighting console", "Lighting Console"),
                ("dmx controller", "DMX Controller"),
            ]),
        ),
        (
            "sound".to_string(),
            type_aliases(&[
                ("speaker", "Speaker"),
                ("loudspeaker", "Speaker"),
                ("microphone", "Microphone"),
                ("mic", "Microphone"),
                ("wireless microphone", "Wireless Microphone"),
                ("wireless mic", "Wireless Microphone"),
                ("mixer", "Audio Mixer"),
                ("mixing console", "Audio Mixer"),
                ("amplifier", "Amplifier"),
                ("power amplifier", "Power Amplifier"),
                ("subwoofer", "Subwoofer"),
                ("monitor", "Monitor Speaker"),
                ("di box", "DI Box"),
                ("compressor", "Compressor"),
                ("equalizer", "Equalizer"),
                ("reverb", "Reverb Unit"),
            ]),
        ),
        (
            "video".to_string(),
            type_aliases(&[
                ("projector", "Projector"),
                ("lcd projector", "LCD Projector"),
                ("led projector", "LED Projector"),
                ("screen", "Projection Screen"),
                ("projection screen", "Projection Screen"),
                ("display", "Display"),
                ("monitor", "Video Monitor"),
                ("led wall", "LED Wall"),
                ("led panel", "LED Panel"),
                ("camera", "Camera"),
                ("video camera", "Video Camera"),
                ("switcher", "Video Switcher"),
                ("video mixer", "Video Switcher"),
                ("scaler", "Video Scaler"),
                ("converter", "Video Converter"),
                ("splitter", "Video Splitter"),
                ("matrix", "Video Matrix"),
            ]),
        ),
    ]
}

fn spec_key(canonical: &str, aliases: &[&str]) -> SpecKeyEntry {
    SpecKeyEntry {
        canonical: canonical.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn builtin_spec_keys() -> Vec<SpecKeyEntry> {
    vec![
        spec_key(
            "power",
            &["power", "wattage", "watts", "power consumption", "power draw"],
        ),
        spec_key("dimensions", &["dimensions", "size", "measurements", "dims"]),
        spec_key("weight", &["weight", "mass"]),
        spec_key(
            "frequency_response",
            &["frequency response", "freq response", "frequency range"],
        ),
        spec_key("impedance", &["impedance", "ohms"]),
        spec_key("spl", &["spl", "sound pressure level", "max spl"]),
        spec_key("throw_distance", &["throw distance", "projection distance"]),
        spec_key("resolution", &["resolution", "native resolution"]),
        spec_key("brightness", &["brightness", "lumens", "ansi lumens"]),
        spec_key("contrast_ratio", &["contrast ratio", "contrast"]),
        spec_key(
            "connectivity",
            &["connectivity", "connections", "inputs", "outputs"],
        ),
    ]
}
