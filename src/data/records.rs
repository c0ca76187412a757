//! Inspection records as delivered by the paginated backend.
//!
//! Records are decoded one at a time so that a single bad row can be skipped
//! without losing the rest of its page.

use crate::{core::geo::LatLng, Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of an inspection, used for marker colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pass,
    Fail,
    ConditionalPass,
    Unknown,
}

impl Category {
    /// Maps a backend `results` string. Anything unrecognised is `Unknown`.
    pub fn from_result(result: &str) -> Self {
        match result.trim().to_ascii_lowercase().as_str() {
            "pass" => Self::Pass,
            "fail" => Self::Fail,
            "pass w/ conditions" | "pass with conditions" | "conditional pass" => {
                Self::ConditionalPass
            }
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::ConditionalPass => "Pass w/ Conditions",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One inspection located on the map. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: NaiveDateTime,
    pub category: Category,
    pub label: String,
    /// Region key supplied by the backend (postal code), when present
    pub region_key: Option<String>,
    pub inspection_id: Option<i64>,
}

impl GeographicPoint {
    pub fn new(
        longitude: f64,
        latitude: f64,
        timestamp: NaiveDateTime,
        category: Category,
        label: impl Into<String>,
    ) -> Self {
        Self {
            longitude,
            latitude,
            timestamp,
            category,
            label: label.into(),
            region_key: None,
            inspection_id: None,
        }
    }

    pub fn with_region_key(mut self, key: impl Into<String>) -> Self {
        self.region_key = Some(key.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Decodes a backend record, rejecting it if a required field is missing.
    pub fn from_record(record: &Value) -> Result<Self> {
        let raw = InspectionRecord::deserialize(record)
            .map_err(|e| Error::MalformedRecord(format!("not an inspection record: {e}")))?;
        raw.into_point()
    }
}

/// Wire shape of a single inspection row
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InspectionRecord {
    #[serde(deserialize_with = "flexible_f64")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "flexible_f64")]
    pub longitude: Option<f64>,
    pub results: Option<String>,
    pub inspection_date: Option<String>,
    pub dba_name: Option<String>,
    pub aka_name: Option<String>,
    pub facility_type: Option<String>,
    pub risk: Option<String>,
    #[serde(deserialize_with = "flexible_string")]
    pub zip: Option<String>,
    #[serde(deserialize_with = "flexible_i64")]
    pub inspection_id: Option<i64>,
}

impl InspectionRecord {
    pub fn into_point(self) -> Result<GeographicPoint> {
        let latitude = self
            .latitude
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::MalformedRecord("missing latitude".into()))?;
        let longitude = self
            .longitude
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::MalformedRecord("missing longitude".into()))?;
        if !LatLng::new(latitude, longitude).is_valid() {
            return Err(Error::MalformedRecord(format!(
                "coordinates out of range: ({longitude}, {latitude})"
            )));
        }

        let date = self
            .inspection_date
            .as_deref()
            .ok_or_else(|| Error::MalformedRecord("missing inspection_date".into()))?;
        let timestamp = parse_timestamp(date)
            .ok_or_else(|| Error::MalformedRecord(format!("unparseable inspection_date {date:?}")))?;

        let label = self
            .dba_name
            .filter(|s| !s.trim().is_empty())
            .or(self.aka_name.filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| match self.inspection_id {
                Some(id) => format!("Inspection #{id}"),
                None => "Unnamed facility".to_string(),
            });

        Ok(GeographicPoint {
            longitude,
            latitude,
            timestamp,
            category: self
                .results
                .as_deref()
                .map(Category::from_result)
                .unwrap_or(Category::Unknown),
            label,
            region_key: self.zip,
            inspection_id: self.inspection_id,
        })
    }
}

/// Accepts `YYYY-MM-DD`, naive ISO datetimes and RFC 3339 timestamps
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn flexible_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn flexible_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn flexible_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
