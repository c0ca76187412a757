use crate::core::{bounds::Bounds, geo::Point};

use rstar::{RTree, RTreeObject, AABB};

/// Bounding box tagged with an id and a payload, usually a slice index
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub bounds: Bounds,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, bounds: Bounds, data: T) -> Self {
        Self { id, bounds, data }
    }

    pub fn from_point(id: String, point: Point, data: T) -> Self {
        Self::new(id, Bounds::at(point), data)
    }
}

fn envelope_of(bounds: &Bounds) -> AABB<[f64; 2]> {
    AABB::from_corners(
        [bounds.min.x, bounds.min.y],
        [bounds.max.x, bounds.max.y],
    )
}

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        envelope_of(&self.bounds)
    }
}

/// R-tree over item bounding boxes, used as the candidate prefilter for
/// point-in-polygon lookups and pointer hit tests
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
    bounds: Option<Bounds>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
            bounds: None,
        }
    }

    /// Builds a balanced tree in one pass; scenes are rebuilt whole, so this
    /// is the common path
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        let bounds = items
            .iter()
            .map(|item| item.bounds)
            .reduce(|acc, b| acc.union(&b));
        Self {
            rtree: RTree::bulk_load(items),
            bounds,
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.bounds = Some(match self.bounds {
            Some(b) => b.union(&item.bounds),
            None => item.bounds,
        });
        self.rtree.insert(item);
    }

    /// Items whose box intersects `bounds`, in no particular order
    pub fn query(&self, bounds: &Bounds) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_in_envelope_intersecting(&envelope_of(bounds))
            .collect()
    }

    /// Extent of everything indexed
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }
}

impl<T> std::fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}
