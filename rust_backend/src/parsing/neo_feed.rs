use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::domain::{km_per_hour_to_km_per_second, FlatRecord, Measurements};
use crate::error::{PipelineError, PipelineResult};
use crate::time::parse_day;

/// Custom deserializer that accepts either string or integer for the asteroid ID
fn deserialize_neo_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    match StringOrInt::deserialize(deserializer)? {
        StringOrInt::String(s) => Ok(s),
        StringOrInt::Int(i) => Ok(i.to_string()),
    }
}

/// A number that the feed may send either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(f64),
    Text(String),
}

impl LooseNumber {
    /// Coerce to a finite float; unparsable text and non-finite values yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            LooseNumber::Number(n) => *n,
            LooseNumber::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Raw JSON structure for the diameter range in kilometers
#[derive(Debug, Clone, Deserialize)]
pub struct RawDiameterRange {
    pub estimated_diameter_min: Option<LooseNumber>,
    pub estimated_diameter_max: Option<LooseNumber>,
}

/// Raw JSON structure for the estimated diameter block
#[derive(Debug, Clone, Deserialize)]
pub struct RawEstimatedDiameter {
    pub kilometers: Option<RawDiameterRange>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMissDistance {
    pub kilometers: Option<LooseNumber>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRelativeVelocity {
    pub kilometers_per_hour: Option<LooseNumber>,
}

/// Raw JSON structure for one close-approach event
#[derive(Debug, Clone, Deserialize)]
pub struct RawCloseApproach {
    pub close_approach_date: Option<String>,
    pub miss_distance: Option<RawMissDistance>,
    pub relative_velocity: Option<RawRelativeVelocity>,
}

/// Raw JSON structure for one asteroid as listed under a feed day
#[derive(Debug, Clone, Deserialize)]
pub struct RawNeo {
    #[serde(deserialize_with = "deserialize_neo_id")]
    pub id: String,
    pub name: String,
    pub estimated_diameter: Option<RawEstimatedDiameter>,
    pub is_potentially_hazardous_asteroid: Option<bool>,
    #[serde(default)]
    pub close_approach_data: Vec<RawCloseApproach>,
}

/// The feed document: asteroid entries grouped by day key.
///
/// Entries are kept as raw JSON so that a feed can be merged and saved
/// unchanged; they are only typed when normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeoFeed {
    #[serde(default)]
    pub element_count: u64,
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<Value>>,
}

impl NeoFeed {
    /// Build a feed from an arbitrary JSON document.
    ///
    /// A missing or non-object `near_earth_objects` key yields an empty feed;
    /// day values that are not arrays are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(days) = value.get("near_earth_objects").and_then(Value::as_object) else {
            warn!("Feed has no 'near_earth_objects' object; treating it as empty");
            return Self::default();
        };

        let mut near_earth_objects = BTreeMap::new();
        for (day, entries) in days {
            match entries.as_array() {
                Some(list) => {
                    near_earth_objects.insert(day.clone(), list.clone());
                }
                None => warn!("Skipping feed day '{}': entries are not a list", day),
            }
        }

        let mut feed = Self {
            element_count: 0,
            near_earth_objects,
        };
        feed.element_count = feed.entry_count() as u64;
        feed
    }

    /// Number of asteroid entries across all days
    pub fn entry_count(&self) -> usize {
        self.near_earth_objects.values().map(Vec::len).sum()
    }

    /// Merge another feed into this one; `other` wins on duplicate day keys.
    pub fn merge(&mut self, other: NeoFeed) {
        self.near_earth_objects.extend(other.near_earth_objects);
        self.element_count = self.entry_count() as u64;
    }
}

/// Parse a feed document from a JSON string
pub fn parse_feed_str(json_str: &str) -> PipelineResult<NeoFeed> {
    let value: Value = serde_json::from_str(json_str).map_err(|e| {
        let preview: String = json_str.chars().take(200).collect();
        PipelineError::MalformedInput(format!(
            "Invalid JSON syntax: {}. First 200 chars: {}",
            e, preview
        ))
    })?;

    Ok(NeoFeed::from_value(&value))
}

/// Parse a feed document from a JSON file
pub fn parse_feed_file(path: &Path) -> PipelineResult<NeoFeed> {
    if !path.exists() {
        return Err(PipelineError::MissingUpstreamArtifact(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_feed_str(&content)
}

/// Type one raw entry, reporting the JSON path of the first offending field
pub fn parse_neo_entry(entry: &Value) -> PipelineResult<RawNeo> {
    serde_path_to_error::deserialize::<_, RawNeo>(entry.clone()).map_err(|e| {
        PipelineError::MalformedInput(format!("at '{}': {}", e.path(), e.inner()))
    })
}

/// Flatten one typed entry listed under `date`.
///
/// Diameter fields stay `None` when the feed has no diameter block, and the
/// mean is only computed when both bounds are present. Approach fields come
/// from the first close-approach event and are `None` when there is none.
pub fn normalize_entry(date: chrono::NaiveDate, raw: &RawNeo) -> FlatRecord {
    let mut measurements = Measurements::default();

    if let Some(km) = raw
        .estimated_diameter
        .as_ref()
        .and_then(|d| d.kilometers.as_ref())
    {
        let min = km.estimated_diameter_min.as_ref().and_then(LooseNumber::as_f64);
        let max = km.estimated_diameter_max.as_ref().and_then(LooseNumber::as_f64);
        measurements.diameter_min_km = min;
        measurements.diameter_max_km = max;
        measurements.diameter_mean_km = match (min, max) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
            _ => None,
        };
    }

    let mut close_approach_date = None;
    if let Some(approach) = raw.close_approach_data.first() {
        measurements.miss_distance_km = approach
            .miss_distance
            .as_ref()
            .and_then(|m| m.kilometers.as_ref())
            .and_then(LooseNumber::as_f64);

        let km_h = approach
            .relative_velocity
            .as_ref()
            .and_then(|v| v.kilometers_per_hour.as_ref())
            .and_then(LooseNumber::as_f64);
        measurements.relative_velocity_km_h = km_h;
        measurements.relative_velocity_km_s = km_h.map(km_per_hour_to_km_per_second);

        close_approach_date = approach.close_approach_date.as_deref().and_then(parse_day);
    }

    FlatRecord {
        date,
        id: raw.id.clone(),
        name: raw.name.clone(),
        measurements,
        is_potentially_hazardous: raw.is_potentially_hazardous_asteroid,
        close_approach_date,
    }
}

/// Flatten every entry of a feed into one record per asteroid per day.
///
/// Malformed entries and unparsable day keys are skipped with a warning; the
/// rest of the batch is kept. Records come out ordered by day key, then in
/// feed order within a day.
pub fn normalize_feed(feed: &NeoFeed) -> Vec<FlatRecord> {
    let mut records = Vec::with_capacity(feed.entry_count());

    for (day_key, entries) in &feed.near_earth_objects {
        let Some(date) = parse_day(day_key) else {
            warn!(
                "Skipping {} entries under unparsable day key '{}'",
                entries.len(),
                day_key
            );
            continue;
        };

        for (idx, entry) in entries.iter().enumerate() {
            match parse_neo_entry(entry) {
                Ok(raw) => records.push(normalize_entry(date, &raw)),
                Err(e) => warn!("Skipping entry {} of {}: {}", idx, day_key, e),
            }
        }
    }

    debug!(
        "Normalized {} of {} feed entries",
        records.len(),
        feed.entry_count()
    );
    records
}
