//! Tolerant configuration snapshot extraction and re-emission.
//!
//! A snapshot is best-effort field extraction with explicit per-field
//! defaults, not a schema-validating parse. A configuration file written by
//! any past or future version of the application yields a usable snapshot;
//! unknown keys are ignored and unrecognized values fall back per field.

use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Market the installation sells into. Drives currency and document labels
/// inside the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Country {
    #[default]
    Paraguay,
    Peru,
    Venezuela,
}

impl Country {
    pub fn as_token(self) -> &'static str {
        match self {
            Country::Paraguay => "PARAGUAY",
            Country::Peru => "PERU",
            Country::Venezuela => "VENEZUELA",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "PARAGUAY" => Some(Country::Paraguay),
            "PERU" => Some(Country::Peru),
            "VENEZUELA" => Some(Country::Venezuela),
            _ => None,
        }
    }
}

/// Which catalog listings the application offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingType {
    Products,
    Presentations,
    #[default]
    Both,
}

impl ListingType {
    pub fn as_token(self) -> &'static str {
        match self {
            ListingType::Products => "PRODUCTOS",
            ListingType::Presentations => "PRESENTACIONES",
            ListingType::Both => "AMBOS",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "PRODUCTOS" => Some(ListingType::Products),
            "PRESENTACIONES" => Some(ListingType::Presentations),
            "AMBOS" => Some(ListingType::Both),
            _ => None,
        }
    }
}

/// Update policy the installed application follows at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    #[default]
    Ask,
    Silent,
    Off,
}

impl UpdateMode {
    pub fn as_token(self) -> &'static str {
        match self {
            UpdateMode::Ask => "ASK",
            UpdateMode::Silent => "SILENT",
            UpdateMode::Off => "OFF",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_uppercase().as_str() {
            "ASK" => Some(UpdateMode::Ask),
            "SILENT" => Some(UpdateMode::Silent),
            "OFF" => Some(UpdateMode::Off),
            _ => None,
        }
    }
}

/// Settings collected from the user on a fresh install.
#[derive(Debug, Clone, Default)]
pub struct WizardAnswers {
    pub country: Country,
    pub listing_type: ListingType,
    pub allow_no_stock: bool,
}

/// User-visible configuration at a point in time.
///
/// `raw` preserves the original file text verbatim; backups copy it
/// unchanged so a migration bug can never lose original data permanently.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub country: Country,
    pub listing_type: ListingType,
    pub allow_no_stock: bool,
    pub update_mode: UpdateMode,
    pub update_check_on_startup: bool,
    pub update_manifest_url: String,
    pub update_flags: String,
    pub raw: String,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            country: Country::default(),
            listing_type: ListingType::default(),
            allow_no_stock: false,
            update_mode: UpdateMode::default(),
            update_check_on_startup: true,
            update_manifest_url: String::new(),
            update_flags: "/CLOSEAPPLICATIONS".to_string(),
            raw: String::new(),
        }
    }
}

impl ConfigSnapshot {
    /// Read a snapshot from disk.
    ///
    /// Returns `None` if the file is absent or unreadable; the caller falls
    /// back to the next-best source. Malformed content is not an error:
    /// every field defaults independently.
    pub fn read(path: &Path) -> Option<ConfigSnapshot> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %err, "config unreadable, ignoring");
                }
                return None;
            }
        };
        Some(Self::extract(&raw))
    }

    /// Extract a snapshot from raw configuration text.
    pub fn extract(raw: &str) -> ConfigSnapshot {
        let defaults = ConfigSnapshot::default();

        ConfigSnapshot {
            country: find_value(raw, "country")
                .and_then(|t| Country::from_token(&t))
                .unwrap_or(defaults.country),
            listing_type: find_value(raw, "listing_type")
                .and_then(|t| ListingType::from_token(&t))
                .unwrap_or(defaults.listing_type),
            allow_no_stock: find_bool(raw, "allow_no_stock").unwrap_or(defaults.allow_no_stock),
            update_mode: find_value(raw, "update_mode")
                .and_then(|t| UpdateMode::from_token(&t))
                .unwrap_or(defaults.update_mode),
            update_check_on_startup: find_bool(raw, "update_check_on_startup")
                .unwrap_or(defaults.update_check_on_startup),
            update_manifest_url: find_value(raw, "update_manifest_url")
                .unwrap_or(defaults.update_manifest_url),
            update_flags: find_value(raw, "update_flags").unwrap_or(defaults.update_flags),
            raw: raw.to_string(),
        }
    }

    /// Build a snapshot from wizard answers, with policy fields defaulted.
    pub fn from_wizard(answers: &WizardAnswers) -> ConfigSnapshot {
        ConfigSnapshot {
            country: answers.country,
            listing_type: answers.listing_type,
            allow_no_stock: answers.allow_no_stock,
            ..ConfigSnapshot::default()
        }
    }

    /// Serialize the snapshot as the configuration file the application
    /// reads at startup.
    pub fn to_json(&self) -> String {
        let value = serde_json::json!({
            "country": self.country.as_token(),
            "listing_type": self.listing_type.as_token(),
            "allow_no_stock": self.allow_no_stock,
            "update_mode": self.update_mode.as_token(),
            "update_check_on_startup": self.update_check_on_startup,
            "update_manifest_url": self.update_manifest_url,
            "update_flags": self.update_flags,
        });
        // json! output of a map of scalars always pretty-prints.
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for ConfigSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} / no_stock={} / updates={}",
            self.country.as_token(),
            self.listing_type.as_token(),
            self.allow_no_stock,
            self.update_mode.as_token(),
        )
    }
}

/// Locate a field value by case-insensitive key search in raw text.
///
/// Scans for the key, skips a `:` or `=` separator, and captures the value
/// token up to a closing delimiter. Surrounding quotes and whitespace are
/// stripped. Returns `None` when the key is absent or no separator follows.
fn find_value(raw: &str, key: &str) -> Option<String> {
    // ASCII fold keeps byte offsets aligned with the original text.
    let folded = raw.to_ascii_lowercase();
    let needle = key.to_ascii_lowercase();

    let mut search_from = 0;
    while let Some(offset) = folded[search_from..].find(&needle) {
        let start = search_from + offset;
        let after_key = start + needle.len();

        // Reject partial key matches such as "country" inside "country_code".
        let next = folded[after_key..].chars().next();
        if matches!(next, Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            search_from = after_key;
            continue;
        }

        let rest = &raw[after_key..];
        let sep = rest.find(|c| c == ':' || c == '=');
        match sep {
            Some(pos) if rest[..pos].trim().trim_matches('"').is_empty() => {
                let value = &rest[pos + 1..];
                let end = value
                    .find(|c| c == ',' || c == '}' || c == '\n' || c == '\r')
                    .unwrap_or(value.len());
                let token = value[..end].trim().trim_matches('"').trim();
                return Some(token.to_string());
            }
            _ => {
                search_from = after_key;
            }
        }
    }
    None
}

/// Extract a boolean field: literal `true`/`false` tokens only.
fn find_bool(raw: &str, key: &str) -> Option<bool> {
    match find_value(raw, key)?.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
