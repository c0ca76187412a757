use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Backend-computed totals for one region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTotals {
    #[serde(default, alias = "total")]
    pub total_inspections: u64,
    #[serde(default, alias = "passed")]
    pub passed_inspections: Option<u64>,
    #[serde(default, alias = "failed")]
    pub failed_inspections: Option<u64>,
}

/// Pre-aggregated heatmap document, `{regionId: {total, passed, failed}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionAggregates {
    pub regions: BTreeMap<String, RegionTotals>,
}

impl RegionAggregates {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn get(&self, region_id: &str) -> Option<&RegionTotals> {
        self.regions.get(region_id)
    }

    pub fn max_total(&self) -> u64 {
        self.regions
            .values()
            .map(|t| t.total_inspections)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_document() {
        let aggregates = RegionAggregates::from_json_str(
            r#"{
                "60601": { "total_inspections": 120, "passed_inspections": 90, "failed_inspections": 30 },
                "60602": { "total": 4 }
            }"#,
        )
        .unwrap();

        assert_eq!(aggregates.max_total(), 120);
        assert_eq!(aggregates.get("60602").unwrap().total_inspections, 4);
        assert_eq!(aggregates.get("60602").unwrap().passed_inspections, None);
    }

    #[test]
    fn test_empty_document() {
        let aggregates = RegionAggregates::from_json_str("{}").unwrap();
        assert_eq!(aggregates.max_total(), 0);
    }
}
