use crate::{
    core::{constants::TOOLTIP_OFFSET, geo::Point},
    data::aggregates::RegionTotals,
    layers::scene::{MarkerShape, ShapeId},
};

/// Tooltip attached to one shape
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub shape: ShapeId,
    pub content: String,
    pub anchor: Point,
}

/// Tooltip position for a pointer position
pub fn anchor_for(pointer: &Point) -> Point {
    Point::new(pointer.x + TOOLTIP_OFFSET.0, pointer.y + TOOLTIP_OFFSET.1)
}

fn or_na(value: Option<u64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

/// `"{property}: {id}"` followed by the region totals when known
pub fn region_content(property: &str, region_id: &str, totals: Option<&RegionTotals>) -> String {
    let (total, passed, failed) = match totals {
        Some(t) => (Some(t.total_inspections), t.passed_inspections, t.failed_inspections),
        None => (None, None, None),
    };
    format!(
        "{property}: {region_id}\nTotal Inspections: {}\nPassed: {}\nFailed: {}",
        or_na(total),
        or_na(passed),
        or_na(failed)
    )
}

pub fn marker_content(marker: &MarkerShape) -> String {
    format!(
        "{}\nDate: {}\nResult: {}",
        marker.label,
        marker.timestamp.format("%Y-%m-%d"),
        marker.category
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_content_with_and_without_totals() {
        let totals = RegionTotals {
            total_inspections: 12,
            passed_inspections: Some(9),
            failed_inspections: None,
        };
        assert_eq!(
            region_content("ZIP", "60601", Some(&totals)),
            "ZIP: 60601\nTotal Inspections: 12\nPassed: 9\nFailed: N/A"
        );
        assert_eq!(
            region_content("ZIP", "60699", None),
            "ZIP: 60699\nTotal Inspections: N/A\nPassed: N/A\nFailed: N/A"
        );
    }

    #[test]
    fn test_anchor_offset() {
        assert_eq!(anchor_for(&Point::new(5.0, 7.0)), Point::new(15.0, 17.0));
    }
}
