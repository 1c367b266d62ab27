//! Axis-aligned bounding boxes in a raster's CRS units.

use gdal::GeoTransform;

/// A rectangular extent with named edges.
///
/// The original tooling this crate grew out of passed extents around as bare
/// tuples in more than one edge order; every boundary here converts through
/// named fields instead. North-up rasters are assumed throughout, so
/// `north > south` and `east > west`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Builds a bounding box from the `(west, north, east, south)` ordering
    /// used by `gdal_translate -projWin` and the climate-archive conventions.
    pub fn from_wnes(bbox: (f64, f64, f64, f64)) -> Self {
        Self {
            west: bbox.0,
            north: bbox.1,
            east: bbox.2,
            south: bbox.3,
        }
    }

    /// The extent covered by a raster with the given geotransform and pixel
    /// dimensions. Assumes zero rotation terms.
    pub fn from_geo_transform(gt: &GeoTransform, size: (usize, usize)) -> Self {
        let (width, height) = size;
        Self {
            west: gt[0],
            north: gt[3],
            east: gt[0] + width as f64 * gt[1],
            south: gt[3] + height as f64 * gt[5],
        }
    }

    /// Edges in `-projWin` order: ulx, uly, lrx, lry.
    pub fn to_projwin(&self) -> (f64, f64, f64, f64) {
        (self.west, self.north, self.east, self.south)
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Smallest box covering both extents.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.west <= other.west
            && self.south <= other.south
            && self.east >= other.east
            && self.north >= other.north
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wnes_round_trip() {
        let bbox = BoundingBox::from_wnes((5.7663, 47.9163, 10.5532, 45.6755));
        assert_eq!(bbox.west, 5.7663);
        assert_eq!(bbox.north, 47.9163);
        assert_eq!(bbox.east, 10.5532);
        assert_eq!(bbox.south, 45.6755);
        assert_eq!(bbox.to_projwin(), (5.7663, 47.9163, 10.5532, 45.6755));
    }

    #[test]
    fn extent_from_geo_transform() {
        // 100x100 pixels at 10m starting at (500_000, 5_300_000)
        let gt: GeoTransform = [500_000.0, 10.0, 0.0, 5_300_000.0, 0.0, -10.0];
        let bbox = BoundingBox::from_geo_transform(&gt, (100, 100));
        assert_eq!(bbox.west, 500_000.0);
        assert_eq!(bbox.east, 501_000.0);
        assert_eq!(bbox.north, 5_300_000.0);
        assert_eq!(bbox.south, 5_299_000.0);
        assert_eq!(bbox.width(), 1000.0);
        assert_eq!(bbox.height(), 1000.0);
    }

    #[test]
    fn union_covers_both() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 15.0, 5.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, -5.0, 15.0, 10.0));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }
}
