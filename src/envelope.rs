//! Geographic envelopes found in catalogue records and feeds.
//!
//! All envelopes are normalized to CRS84 (longitude, latitude) axis order. A west
//! bound greater than the east bound denotes a box crossing the antimeridian.

use geo::{Intersects, Rect, coord};
use roxmltree::Node;
use std::fmt;

use crate::error::{EtsError, EtsResult};
use crate::namespaces;
use crate::xml;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl Envelope {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south: south.min(north),
            east,
            north: south.max(north),
        }
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// The envelope as rectangles; two when it crosses the antimeridian.
    pub fn rects(&self) -> Vec<Rect<f64>> {
        let rect = |west: f64, east: f64| {
            Rect::new(
                coord! { x: west, y: self.south },
                coord! { x: east, y: self.north },
            )
        };
        if self.crosses_antimeridian() {
            vec![rect(self.west, 180.0), rect(-180.0, self.east)]
        } else {
            vec![rect(self.west, self.east)]
        }
    }

    /// Envelopes sharing a boundary intersect.
    pub fn intersects(&self, other: &Envelope) -> bool {
        let theirs = other.rects();
        self.rects()
            .iter()
            .any(|a| theirs.iter().any(|b| a.intersects(b)))
    }

    /// Smallest envelope containing both. Longitudes span the whole globe when either
    /// crosses the antimeridian.
    pub fn union(&self, other: &Envelope) -> Envelope {
        let (west, east) = if self.crosses_antimeridian() || other.crosses_antimeridian() {
            (-180.0, 180.0)
        } else {
            (self.west.min(other.west), self.east.max(other.east))
        };
        Envelope::new(
            west,
            self.south.min(other.south),
            east,
            self.north.max(other.north),
        )
    }

    /// Value of the OpenSearch `geo:box` parameter: `west,south,east,north`.
    pub fn to_box_param(&self) -> String {
        format!("{},{},{},{}", self.west(), self.south(), self.east(), self.north())
    }

    /// Parse a `georss:box` value: `lat_min lon_min lat_max lon_max`.
    pub fn from_georss_box(value: &str) -> EtsResult<Self> {
        let c = parse_coordinates(value, 4)?;
        Ok(Envelope::new(c[1], c[0], c[3], c[2]))
    }

    /// Build from lower/upper corner positions in the axis order of `crs`.
    pub fn from_corners(lower: &str, upper: &str, crs: Option<&str>) -> EtsResult<Self> {
        let lower = parse_coordinates(lower, 2)?;
        let upper = parse_coordinates(upper, 2)?;
        if crs.is_some_and(is_lat_lon) {
            Ok(Envelope::new(lower[1], lower[0], upper[1], upper[0]))
        } else {
            Ok(Envelope::new(lower[0], lower[1], upper[0], upper[1]))
        }
    }

    /// Envelope represented by an element, if it is one of the recognized kinds:
    /// `georss:box`, `georss:where`, `gml:Envelope`, `ows:BoundingBox` or
    /// `ows:WGS84BoundingBox`. Envelopes in a projected CRS are ignored.
    pub fn from_element(node: Node<'_, '_>) -> Option<EtsResult<Self>> {
        if xml::is_element(node, namespaces::GEORSS, "box") {
            let value = xml::text(node).unwrap_or_default();
            return Some(Envelope::from_georss_box(&value));
        }
        if xml::is_element(node, namespaces::GEORSS, "where") {
            let envelope = xml::descendants(node, namespaces::GML32, "Envelope").next()?;
            return Envelope::from_element(envelope);
        }
        if xml::is_element(node, namespaces::GML32, "Envelope") {
            let crs = geographic_crs(node, "srsName")?;
            return Some(corners(node, namespaces::GML32, "lowerCorner", "upperCorner", crs));
        }
        if xml::is_element(node, namespaces::OWS, "BoundingBox") {
            let crs = geographic_crs(node, "crs")?;
            return Some(corners(node, namespaces::OWS, "LowerCorner", "UpperCorner", crs));
        }
        if xml::is_element(node, namespaces::OWS, "WGS84BoundingBox") {
            return Some(corners(node, namespaces::OWS, "LowerCorner", "UpperCorner", None));
        }
        None
    }

    /// First envelope found among the descendants of `node`.
    pub fn find_in(node: Node<'_, '_>) -> Option<EtsResult<Self>> {
        node.descendants()
            .skip(1)
            .filter(|n| n.is_element())
            .find_map(Envelope::from_element)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[W: {}, S: {}, E: {}, N: {}]",
            self.west(),
            self.south(),
            self.east(),
            self.north()
        )
    }
}

fn corners(
    node: Node<'_, '_>,
    namespace: &str,
    lower: &str,
    upper: &str,
    crs: Option<&str>,
) -> EtsResult<Envelope> {
    let lower_value = xml::child_text(node, namespace, lower)
        .ok_or_else(|| EtsError::UnexpectedContent(format!("Missing {} in envelope", lower)))?;
    let upper_value = xml::child_text(node, namespace, upper)
        .ok_or_else(|| EtsError::UnexpectedContent(format!("Missing {} in envelope", upper)))?;
    Envelope::from_corners(&lower_value, &upper_value, crs)
}

/// CRS attribute of an envelope element; `None` when the CRS is not geographic.
fn geographic_crs<'a>(node: Node<'a, '_>, attribute: &str) -> Option<Option<&'a str>> {
    match node.attribute(attribute) {
        Some(crs) if !is_geographic(crs) => {
            tracing::debug!("Ignoring {} envelope in CRS {}", xml::qualified_name(node), crs);
            None
        }
        crs => Some(crs),
    }
}

/// Whether envelope coordinates in this CRS are longitudes and latitudes (CRS84 or EPSG 4326).
pub fn is_geographic(crs: &str) -> bool {
    let crs = crs.trim();
    crs.ends_with("CRS84") || is_lat_lon(crs)
}

/// Whether a CRS identifier uses latitude/longitude axis order (EPSG 4326).
pub fn is_lat_lon(crs: &str) -> bool {
    let crs = crs.trim();
    crs.contains("EPSG") && (crs.ends_with(":4326") || crs.ends_with("/4326"))
}

fn parse_coordinates(value: &str, expected: usize) -> EtsResult<Vec<f64>> {
    let coords = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| EtsError::UnexpectedContent(format!("Invalid coordinate in '{}': {}", value, e)))?;
    if coords.len() != expected {
        return Err(EtsError::UnexpectedContent(format!(
            "Expected {} coordinates but found {} in '{}'",
            expected,
            coords.len(),
            value
        )));
    }
    Ok(coords)
}
