use camino::Utf8Path;
use serde_json::Value;
use std::fmt::Write as _;

use crate::error::{Error, Result};
use crate::keypath::{KeyPath, Segment};

/// Top-level key holding the provider list in the configuration document.
pub const PROVIDER_LIST_KEY: &str = "geo_providers";

// Field names as they appear in the configuration document, in check order.
const FIELD_NAME: &str = "name";
const FIELD_BASE_URL: &str = "base_url";
const FIELD_RES_PATH: &str = "res_path";
const FIELD_LOC_KEYS: &str = "loc_keys";
const FIELD_STAT_KEY: &str = "stat_key";
const FIELD_STAT_VAL: &str = "stat_val";

/// Describes one third-party geocoding provider: how to query it and how to
/// validate and read its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    /// Identifier used in logs, debug traces and fixture file names.
    pub name: String,
    /// URL prefix; the URL-encoded address is appended to it.
    pub request_template: String,
    /// Location of the status field in the response.
    pub status_path: KeyPath,
    /// Value the status field must have, compared as text.
    pub expected_status: String,
    /// Location of the object or array holding the coordinates.
    pub coordinates_path: KeyPath,
    /// Latitude and longitude keys inside the coordinates container.
    pub coordinate_keys: (Segment, Segment),
}

impl ProviderSpec {
    /// Build a provider from one configuration entry.
    ///
    /// `index` is the entry's position in the provider list and is only used
    /// for error reporting.
    pub fn from_entry(entry: &Value, index: usize) -> Result<Self> {
        let name = required_str(entry, FIELD_NAME, index)?;
        let base_url = required_str(entry, FIELD_BASE_URL, index)?;
        let res_path = required_str(entry, FIELD_RES_PATH, index)?;
        let loc_keys = required_str(entry, FIELD_LOC_KEYS, index)?;
        let stat_key = required_str(entry, FIELD_STAT_KEY, index)?;
        let stat_val = required_str(entry, FIELD_STAT_VAL, index)?;

        let keys: Vec<&str> = loc_keys.split_whitespace().collect();
        let coordinate_keys = match keys.as_slice() {
            [lat, lon] => (Segment::parse(lat), Segment::parse(lon)),
            _ => {
                return Err(Error::InvalidProviderField {
                    field: FIELD_LOC_KEYS,
                    index,
                    reason: format!("expected a latitude and a longitude key, got {}", keys.len()),
                })
            }
        };

        Ok(Self {
            name: name.to_string(),
            request_template: base_url.to_string(),
            status_path: required_path(stat_key, FIELD_STAT_KEY, index)?,
            expected_status: stat_val.to_string(),
            coordinates_path: required_path(res_path, FIELD_RES_PATH, index)?,
            coordinate_keys,
        })
    }

    /// Full request URL for an already URL-encoded address.
    #[inline]
    pub fn request_url(&self, encoded_address: &str) -> String {
        format!("{}{}", self.request_template, encoded_address)
    }
}

fn required_str<'a>(entry: &'a Value, field: &'static str, index: usize) -> Result<&'a str> {
    match entry.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
        None | Some(Value::Null) | Some(Value::String(_)) => {
            Err(Error::MissingProviderField { field, index })
        }
        Some(other) => Err(Error::InvalidProviderField {
            field,
            index,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

fn required_path(expr: &str, field: &'static str, index: usize) -> Result<KeyPath> {
    let path = KeyPath::compile(expr);
    if path.is_empty() {
        return Err(Error::InvalidProviderField {
            field,
            index,
            reason: "path has no keys".to_string(),
        });
    }
    Ok(path)
}

/// Ordered, read-only collection of configured providers.
///
/// Order is significant: it is the order in which providers are tried.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderSpec>,
}

impl ProviderRegistry {
    /// Load providers from a JSON configuration file.
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::ProvidersNotFound {
                path: path.to_owned(),
            },
            _ => Error::Io(err),
        })?;
        let document: Value =
            serde_json::from_str(&text).map_err(|source| Error::ProvidersParse {
                path: path.to_owned(),
                source,
            })?;
        Self::from_value(&document)
    }

    /// Load providers from an already parsed configuration document.
    ///
    /// Every entry is validated; the first malformed entry aborts the load.
    pub fn from_value(document: &Value) -> Result<Self> {
        let entries = document
            .get(PROVIDER_LIST_KEY)
            .and_then(Value::as_array)
            .ok_or(Error::MissingProviderList {
                key: PROVIDER_LIST_KEY,
            })?;

        let providers = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| ProviderSpec::from_entry(entry, index))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { providers })
    }

    /// Providers in priority order.
    #[must_use]
    pub fn providers(&self) -> &[ProviderSpec] {
        &self.providers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    /// Human-readable summary of every provider, in priority order.
    pub fn describe(&self) -> String {
        let mut output = String::new();

        if self.providers.is_empty() {
            output.push_str("No geocode providers configured\n");
            return output;
        }

        output.push_str("Configured geocode providers (in priority order):\n\n");
        for (i, provider) in self.providers.iter().enumerate() {
            let (lat, lon) = &provider.coordinate_keys;
            let _ = writeln!(output, "{}. {}", i + 1, provider.name);
            let _ = writeln!(output, "  Request URL: {}<address>", provider.request_template);
            let _ = writeln!(
                output,
                "  Status: {} == '{}'",
                provider.status_path, provider.expected_status
            );
            let _ = writeln!(output, "  Coordinates: {}", provider.coordinates_path);
            let _ = writeln!(output, "  Lat/Lon keys: {} {}", lat, lon);
            output.push('\n');
        }

        output
    }
}
