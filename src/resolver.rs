use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::keypath::Segment;
use crate::provider::{ProviderRegistry, ProviderSpec};
use crate::source::ResponseSource;

/// A resolved geographic coordinate.
///
/// Besides the numeric values, a location remembers how the provider wrote
/// each coordinate so it is reported exactly as received (`1` stays `1`,
/// `"40.70"` stays `40.70`). Equality compares the numeric values only.
#[derive(Debug, Clone)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    text: (String, String),
}

impl Location {
    /// Location from numeric values, written in their shortest round-trip
    /// form (`-74.0` stays `-74.0`).
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let mut lat = ryu::Buffer::new();
        let mut lon = ryu::Buffer::new();
        let text = (
            lat.format_finite(latitude).to_string(),
            lon.format_finite(longitude).to_string(),
        );
        Self {
            latitude,
            longitude,
            text,
        }
    }

    fn with_text(latitude: Coordinate, longitude: Coordinate) -> Self {
        Self {
            latitude: latitude.value,
            longitude: longitude.value,
            text: (latitude.text, longitude.text),
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lat: {}, lon: {}", self.text.0, self.text.1)
    }
}

// One coordinate as read from a response.
struct Coordinate {
    value: f64,
    text: String,
}

/// Result of resolving one address.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// The first provider that answered with a valid response.
    Resolved(Location),
    /// Debug mode: one entry per provider that answered successfully, in
    /// provider order.
    DebugTrace(Vec<String>),
    /// No provider produced a usable response.
    Failed,
}

/// Resolves addresses against a fixed provider chain.
#[derive(Debug)]
pub struct Resolver {
    registry: Arc<ProviderRegistry>,
    source: Box<dyn ResponseSource>,
    debug: bool,
}

impl Resolver {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        source: impl ResponseSource + 'static,
        debug: bool,
    ) -> Self {
        Self {
            registry,
            source: Box::new(source),
            debug,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Resolve `address` using the configured providers, source and mode.
    pub fn resolve(&self, address: &str) -> ResolutionOutcome {
        resolve(
            address,
            self.registry.providers(),
            self.source.as_ref(),
            self.debug,
        )
    }
}

/// Try each provider in order until one yields a location.
///
/// A provider that cannot be fetched, returns something other than JSON, or
/// whose response does not match its configured schema is logged and skipped.
/// In debug mode every provider is queried and each success is recorded in
/// the returned trace instead of returning early.
pub fn resolve(
    address: &str,
    providers: &[ProviderSpec],
    source: &dyn ResponseSource,
    debug: bool,
) -> ResolutionOutcome {
    let encoded = encode_address(address);
    let mut trace = Vec::new();

    for provider in providers {
        let Some(location) = query_provider(provider, &encoded, source) else {
            continue;
        };

        if debug {
            trace.push(trace_entry(&provider.name, &location));
        } else {
            tracing::debug!(provider = %provider.name, %location, "address resolved");
            return ResolutionOutcome::Resolved(location);
        }
    }

    if debug {
        ResolutionOutcome::DebugTrace(trace)
    } else {
        tracing::debug!(providers = providers.len(), "no provider resolved the address");
        ResolutionOutcome::Failed
    }
}

/// Form-urlencode an address for appending to a provider URL.
pub fn encode_address(address: &str) -> String {
    url::form_urlencoded::byte_serialize(address.as_bytes()).collect()
}

/// Debug trace line for a provider that answered successfully.
pub fn trace_entry(provider_name: &str, location: &Location) -> String {
    format!("provider: {}, {}", provider_name, location)
}

fn query_provider(
    provider: &ProviderSpec,
    encoded_address: &str,
    source: &dyn ResponseSource,
) -> Option<Location> {
    match fetch_document(provider, encoded_address, source) {
        Ok(document) => extract_location(provider, &document),
        Err(err) => {
            tracing::error!(provider = %provider.name, error = %err, "failed to query provider");
            None
        }
    }
}

fn fetch_document(
    provider: &ProviderSpec,
    encoded_address: &str,
    source: &dyn ResponseSource,
) -> Result<Value> {
    let body = source.fetch(provider, encoded_address)?;
    Ok(serde_json::from_str(&body)?)
}

/// Validate a parsed provider response and read its coordinates.
///
/// Returns `None` (after logging a warning) when the status does not match
/// or the coordinates cannot be found.
pub fn extract_location(provider: &ProviderSpec, document: &Value) -> Option<Location> {
    // null counts as no status at all
    let status = provider
        .status_path
        .lookup(document)
        .filter(|status| !status.is_null())
        .map(value_text);
    if status.as_deref() != Some(provider.expected_status.as_str()) {
        tracing::warn!(
            provider = %provider.name,
            got = status.as_deref().unwrap_or("<missing>"),
            expected = %provider.expected_status,
            "invalid response status"
        );
        return None;
    }

    let Some(coords) = provider.coordinates_path.lookup(document) else {
        tracing::warn!(
            provider = %provider.name,
            path = %provider.coordinates_path,
            "could not find coordinates"
        );
        return None;
    };

    let (lat_key, lon_key) = &provider.coordinate_keys;
    let latitude = read_coordinate(provider, coords, lat_key)?;
    let longitude = read_coordinate(provider, coords, lon_key)?;

    Some(Location::with_text(latitude, longitude))
}

fn read_coordinate(provider: &ProviderSpec, coords: &Value, key: &Segment) -> Option<Coordinate> {
    let parsed = key.get(coords).and_then(coordinate_value);
    if parsed.is_none() {
        tracing::warn!(
            provider = %provider.name,
            path = %provider.coordinates_path,
            %key,
            "missing or non-numeric coordinate"
        );
    }
    parsed
}

// Numbers, or strings holding a decimal number. The text is kept as written.
fn coordinate_value(value: &Value) -> Option<Coordinate> {
    let (parsed, text) = match value {
        Value::Number(n) => (n.as_f64()?, n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            (s.parse::<f64>().ok()?, s.to_string())
        }
        _ => return None,
    };
    parsed.is_finite().then_some(Coordinate {
        value: parsed,
        text,
    })
}

/// Text form of a JSON value used for status comparison: strings compare by
/// content, everything else by its compact JSON text (`200`, `true`).
pub fn value_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}
