//! Decoding of ESRI-JSON geometry payloads into simple-feature geometries.
//!
//! The geometry type is uniform across a layer, so callers resolve a
//! [`GeometryType`] once and decode every feature with it. Absent geometry
//! (a missing or `null` payload, or a payload without coordinates) decodes to
//! the empty value of that type; payloads whose coordinate structure is wrong
//! fail with [`EsriJsonError::MalformedGeometry`].

use std::fmt;
use std::str::FromStr;

use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde_json::Value as JsonValue;

use crate::error::{EsriJsonError, EsriJsonResult};

/// Geometry type of an ArcGIS layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    /// `esriGeometryPoint`
    Point,
    /// `esriGeometryMultipoint`
    Multipoint,
    /// `esriGeometryPolyline`
    Polyline,
    /// `esriGeometryPolygon`
    Polygon,
}

impl GeometryType {
    /// All geometry types the decoder understands.
    pub const ALL: [GeometryType; 4] = [
        GeometryType::Point,
        GeometryType::Multipoint,
        GeometryType::Polyline,
        GeometryType::Polygon,
    ];

    /// Parse the `geometryType` member of ArcGIS layer metadata.
    ///
    /// Returns `None` for names this crate cannot decode (for example
    /// `esriGeometryEnvelope`), which callers treat as an unresolved type.
    #[must_use]
    pub fn from_esri_name(name: &str) -> Option<Self> {
        match name {
            "esriGeometryPoint" => Some(GeometryType::Point),
            "esriGeometryMultipoint" => Some(GeometryType::Multipoint),
            "esriGeometryPolyline" => Some(GeometryType::Polyline),
            "esriGeometryPolygon" => Some(GeometryType::Polygon),
            _ => None,
        }
    }

    /// The ArcGIS name of this geometry type.
    #[must_use]
    pub fn esri_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "esriGeometryPoint",
            GeometryType::Multipoint => "esriGeometryMultipoint",
            GeometryType::Polyline => "esriGeometryPolyline",
            GeometryType::Polygon => "esriGeometryPolygon",
        }
    }

    /// Name of the simple-feature geometry produced for this type.
    #[must_use]
    pub fn simple_feature_name(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::Multipoint => "MULTIPOINT",
            GeometryType::Polyline => "MULTILINESTRING",
            GeometryType::Polygon => "MULTIPOLYGON",
        }
    }

    /// The empty geometry of this type.
    #[must_use]
    pub fn empty_geometry(&self) -> SfGeometry {
        match self {
            GeometryType::Point => SfGeometry::EmptyPoint,
            GeometryType::Multipoint => SfGeometry::MultiPoint(MultiPoint(Vec::new())),
            GeometryType::Polyline => SfGeometry::MultiLineString(MultiLineString(Vec::new())),
            GeometryType::Polygon => SfGeometry::MultiPolygon(MultiPolygon(Vec::new())),
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.esri_name())
    }
}

impl FromStr for GeometryType {
    type Err = String;

    /// Accepts ArcGIS names as well as the short forms used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(geometry_type) = Self::from_esri_name(s) {
            return Ok(geometry_type);
        }
        match s.to_ascii_lowercase().as_str() {
            "point" => Ok(GeometryType::Point),
            "multipoint" => Ok(GeometryType::Multipoint),
            "polyline" | "line" | "linestring" => Ok(GeometryType::Polyline),
            "polygon" => Ok(GeometryType::Polygon),
            _ => Err(format!(
                "unknown geometry type '{s}' (expected point, multipoint, polyline or polygon)"
            )),
        }
    }
}

/// A decoded simple-feature geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum SfGeometry {
    Point(Point<f64>),
    /// A point feature without coordinates.
    EmptyPoint,
    MultiPoint(MultiPoint<f64>),
    MultiLineString(MultiLineString<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl SfGeometry {
    /// Returns `true` for the empty value of any geometry kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            SfGeometry::Point(_) => false,
            SfGeometry::EmptyPoint => true,
            SfGeometry::MultiPoint(points) => points.0.is_empty(),
            SfGeometry::MultiLineString(lines) => lines.0.is_empty(),
            SfGeometry::MultiPolygon(polygons) => polygons.0.is_empty(),
        }
    }

    /// Simple-feature name of this geometry, e.g. `MULTIPOLYGON`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SfGeometry::Point(_) | SfGeometry::EmptyPoint => "POINT",
            SfGeometry::MultiPoint(_) => "MULTIPOINT",
            SfGeometry::MultiLineString(_) => "MULTILINESTRING",
            SfGeometry::MultiPolygon(_) => "MULTIPOLYGON",
        }
    }

    /// Convert to a `geo-types` geometry. An empty point has no
    /// `geo-types` representation and yields `None`.
    #[must_use]
    pub fn to_geo(&self) -> Option<Geometry<f64>> {
        match self {
            SfGeometry::Point(point) => Some(Geometry::Point(*point)),
            SfGeometry::EmptyPoint => None,
            SfGeometry::MultiPoint(points) => Some(Geometry::MultiPoint(points.clone())),
            SfGeometry::MultiLineString(lines) => Some(Geometry::MultiLineString(lines.clone())),
            SfGeometry::MultiPolygon(polygons) => Some(Geometry::MultiPolygon(polygons.clone())),
        }
    }
}

/// Decode one ESRI-JSON geometry payload as `geometry_type`.
///
/// `raw` is the `geometry` member of a feature; `None` and JSON `null` both
/// mean the feature has no geometry.
///
/// # Errors
///
/// Returns [`EsriJsonError::MalformedGeometry`] when the payload is not an
/// object, when its coordinate list is not an array, or when a coordinate is
/// not an array of at least two numbers.
pub fn decode_geometry(
    raw: Option<&JsonValue>,
    geometry_type: GeometryType,
) -> EsriJsonResult<SfGeometry> {
    let object = match raw {
        None | Some(JsonValue::Null) => return Ok(geometry_type.empty_geometry()),
        Some(JsonValue::Object(object)) => object,
        Some(other) => {
            return Err(EsriJsonError::malformed(
                geometry_type,
                format!("expected a geometry object, found {}", describe_value(other)),
            ));
        },
    };

    match geometry_type {
        GeometryType::Point => Ok(decode_point(object)),
        GeometryType::Multipoint => decode_multipoint(object),
        GeometryType::Polyline => decode_polyline(object),
        GeometryType::Polygon => decode_polygon(object),
    }
}

fn decode_point(object: &serde_json::Map<String, JsonValue>) -> SfGeometry {
    let x = object.get("x").and_then(JsonValue::as_f64);
    let y = object.get("y").and_then(JsonValue::as_f64);
    match (x, y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => SfGeometry::Point(Point::new(x, y)),
        _ => SfGeometry::EmptyPoint,
    }
}

fn decode_multipoint(object: &serde_json::Map<String, JsonValue>) -> EsriJsonResult<SfGeometry> {
    let geometry_type = GeometryType::Multipoint;
    let Some(points) = member_array(object, "points", geometry_type)? else {
        return Ok(geometry_type.empty_geometry());
    };

    let points = points
        .iter()
        .enumerate()
        .map(|(index, value)| {
            parse_coord(value, geometry_type)
                .map(Point::from)
                .map_err(|err| err.with_additional_context(format!("point {index}")))
        })
        .collect::<EsriJsonResult<Vec<_>>>()?;

    Ok(SfGeometry::MultiPoint(MultiPoint(points)))
}

fn decode_polyline(object: &serde_json::Map<String, JsonValue>) -> EsriJsonResult<SfGeometry> {
    let geometry_type = GeometryType::Polyline;
    let Some(paths) = member_array(object, "paths", geometry_type)? else {
        return Ok(geometry_type.empty_geometry());
    };

    let lines = paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            parse_coord_list(path, geometry_type)
                .map_err(|err| err.with_additional_context(format!("path {index}")))
        })
        .collect::<EsriJsonResult<Vec<_>>>()?;

    Ok(SfGeometry::MultiLineString(MultiLineString(lines)))
}

/// All rings of one feature form a single polygon: the first ring is the
/// exterior and the rest are interiors, in server order. Ring nesting and
/// winding order are not inspected.
fn decode_polygon(object: &serde_json::Map<String, JsonValue>) -> EsriJsonResult<SfGeometry> {
    let geometry_type = GeometryType::Polygon;
    let Some(rings) = member_array(object, "rings", geometry_type)? else {
        return Ok(geometry_type.empty_geometry());
    };

    let mut rings = rings
        .iter()
        .enumerate()
        .map(|(index, ring)| {
            parse_coord_list(ring, geometry_type)
                .map_err(|err| err.with_additional_context(format!("ring {index}")))
        })
        .collect::<EsriJsonResult<Vec<_>>>()?
        .into_iter();

    let Some(exterior) = rings.next() else {
        return Ok(geometry_type.empty_geometry());
    };
    let polygon = Polygon::new(exterior, rings.collect());

    Ok(SfGeometry::MultiPolygon(MultiPolygon(vec![polygon])))
}

/// Look up a coordinate-list member. A missing, `null` or empty array member
/// yields `None` so the caller can return the empty geometry.
fn member_array<'a>(
    object: &'a serde_json::Map<String, JsonValue>,
    member: &str,
    geometry_type: GeometryType,
) -> EsriJsonResult<Option<&'a Vec<JsonValue>>> {
    match object.get(member) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Array(items)) if items.is_empty() => Ok(None),
        Some(JsonValue::Array(items)) => Ok(Some(items)),
        Some(other) => Err(EsriJsonError::malformed(
            geometry_type,
            format!("'{member}' must be an array, found {}", describe_value(other)),
        )),
    }
}

fn parse_coord_list(
    value: &JsonValue,
    geometry_type: GeometryType,
) -> EsriJsonResult<LineString<f64>> {
    let JsonValue::Array(coords) = value else {
        return Err(EsriJsonError::malformed(
            geometry_type,
            format!("expected an array of coordinates, found {}", describe_value(value)),
        ));
    };

    coords
        .iter()
        .map(|coord| parse_coord(coord, geometry_type))
        .collect::<EsriJsonResult<Vec<_>>>()
        .map(LineString)
}

/// Read `[x, y, ...]`; z and m ordinates are ignored.
fn parse_coord(value: &JsonValue, geometry_type: GeometryType) -> EsriJsonResult<Coord<f64>> {
    let ordinates = match value {
        JsonValue::Array(ordinates) if ordinates.len() >= 2 => ordinates,
        _ => {
            return Err(EsriJsonError::malformed(
                geometry_type,
                format!(
                    "expected a coordinate array of at least two numbers, found {}",
                    describe_value(value)
                ),
            ));
        },
    };

    match (ordinates[0].as_f64(), ordinates[1].as_f64()) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(EsriJsonError::malformed(
            geometry_type,
            format!("coordinate {value} has non-numeric ordinates"),
        )),
    }
}

/// Helper to describe JSON value kinds for error messages.
pub(crate) fn describe_value(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: &JsonValue, geometry_type: GeometryType) -> SfGeometry {
        decode_geometry(Some(value), geometry_type).expect("decode")
    }

    #[test]
    fn point_with_coordinates() {
        let geometry = decode(&json!({"x": 1.0, "y": 2.0}), GeometryType::Point);
        assert_eq!(geometry, SfGeometry::Point(Point::new(1.0, 2.0)));
        assert!(!geometry.is_empty());
    }

    #[test]
    fn point_with_integer_coordinates() {
        let geometry = decode(&json!({"x": 1, "y": 2}), GeometryType::Point);
        assert_eq!(geometry, SfGeometry::Point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn point_without_coordinates_is_empty() {
        assert_eq!(decode(&json!({}), GeometryType::Point), SfGeometry::EmptyPoint);
        assert_eq!(
            decode(&json!({"x": null, "y": null}), GeometryType::Point),
            SfGeometry::EmptyPoint
        );
        assert_eq!(
            decode(&json!({"x": "NaN", "y": "NaN"}), GeometryType::Point),
            SfGeometry::EmptyPoint
        );
        assert_eq!(
            decode(&json!({"x": 3.0}), GeometryType::Point),
            SfGeometry::EmptyPoint
        );
    }

    #[test]
    fn absent_geometry_is_empty_for_every_type() {
        for geometry_type in GeometryType::ALL {
            let missing = decode_geometry(None, geometry_type).expect("missing");
            let null = decode_geometry(Some(&JsonValue::Null), geometry_type).expect("null");
            assert!(missing.is_empty(), "{geometry_type} missing");
            assert!(null.is_empty(), "{geometry_type} null");
            assert_eq!(missing, geometry_type.empty_geometry());
        }
    }

    #[test]
    fn polygon_single_ring() {
        let geometry = decode(
            &json!({"rings": [[[0, 0], [0, 1], [1, 1], [1, 0], [0, 0]]]}),
            GeometryType::Polygon,
        );

        let SfGeometry::MultiPolygon(polygons) = geometry else {
            panic!("expected a multipolygon");
        };
        assert_eq!(polygons.0.len(), 1);
        let polygon = &polygons.0[0];
        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.interiors().is_empty());
        assert_eq!(polygon.exterior().0[2], Coord { x: 1.0, y: 1.0 });
    }

    #[test]
    fn polygon_rings_share_one_part() {
        let geometry = decode(
            &json!({"rings": [
                [[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]],
                [[2, 2], [4, 2], [4, 4], [2, 4], [2, 2]],
                [[20, 20], [20, 21], [21, 21], [20, 20]]
            ]}),
            GeometryType::Polygon,
        );

        let SfGeometry::MultiPolygon(polygons) = geometry else {
            panic!("expected a multipolygon");
        };
        assert_eq!(polygons.0.len(), 1);
        assert_eq!(polygons.0[0].interiors().len(), 2);
    }

    #[test]
    fn polygon_without_rings_is_empty() {
        assert!(decode(&json!({"rings": []}), GeometryType::Polygon).is_empty());
        assert!(decode(&json!({}), GeometryType::Polygon).is_empty());
    }

    #[test]
    fn polyline_paths_become_lines() {
        let geometry = decode(
            &json!({"paths": [[[0, 0], [1, 1]], [[2, 2], [3, 3], [4, 4]]]}),
            GeometryType::Polyline,
        );

        let SfGeometry::MultiLineString(lines) = geometry else {
            panic!("expected a multilinestring");
        };
        assert_eq!(lines.0.len(), 2);
        assert_eq!(lines.0[1].0.len(), 3);
    }

    #[test]
    fn polyline_without_paths_is_empty() {
        let geometry = decode(&json!({}), GeometryType::Polyline);
        assert_eq!(geometry, SfGeometry::MultiLineString(MultiLineString(Vec::new())));
        assert!(decode(&json!({"paths": null}), GeometryType::Polyline).is_empty());
    }

    #[test]
    fn multipoint_points() {
        let geometry = decode(
            &json!({"points": [[1, 2], [3, 4, 5]]}),
            GeometryType::Multipoint,
        );
        assert_eq!(
            geometry,
            SfGeometry::MultiPoint(MultiPoint(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]))
        );
    }

    #[test]
    fn z_and_m_ordinates_are_dropped() {
        let geometry = decode(
            &json!({"hasZ": true, "hasM": true, "paths": [[[1, 2, 3, 4], [5, 6, 7, 8]]]}),
            GeometryType::Polyline,
        );
        let SfGeometry::MultiLineString(lines) = geometry else {
            panic!("expected a multilinestring");
        };
        assert_eq!(lines.0[0].0, vec![Coord { x: 1.0, y: 2.0 }, Coord { x: 5.0, y: 6.0 }]);
    }

    #[test]
    fn short_coordinate_is_malformed() {
        let err = decode_geometry(Some(&json!({"paths": [[[1, 2], [3]]]})), GeometryType::Polyline)
            .unwrap_err();
        match err {
            EsriJsonError::MalformedGeometry {
                geometry_type,
                message,
                ..
            } => {
                assert_eq!(geometry_type, GeometryType::Polyline);
                assert!(message.contains("at least two numbers"));
                assert!(message.contains("path 0"));
            },
            _ => panic!("Expected MalformedGeometry error"),
        }
    }

    #[test]
    fn non_array_rings_are_malformed() {
        let err = decode_geometry(Some(&json!({"rings": "nope"})), GeometryType::Polygon)
            .unwrap_err();
        assert!(err.to_string().contains("'rings' must be an array, found string"));
    }

    #[test]
    fn non_object_geometry_is_malformed() {
        let err = decode_geometry(Some(&json!([1, 2])), GeometryType::Point).unwrap_err();
        assert!(err.to_string().contains("expected a geometry object, found array"));
    }

    #[test]
    fn decoding_is_idempotent() {
        let raw = json!({"rings": [[[0, 0], [0, 1], [1, 1], [0, 0]]]});
        let first = decode(&raw, GeometryType::Polygon);
        let second = decode(&raw, GeometryType::Polygon);
        assert_eq!(first, second);
    }

    #[test]
    fn geometry_type_names() {
        assert_eq!(
            GeometryType::from_esri_name("esriGeometryPolygon"),
            Some(GeometryType::Polygon)
        );
        assert_eq!(GeometryType::from_esri_name("esriGeometryEnvelope"), None);
        assert_eq!("Polyline".parse::<GeometryType>(), Ok(GeometryType::Polyline));
        assert_eq!(
            "esriGeometryMultipoint".parse::<GeometryType>(),
            Ok(GeometryType::Multipoint)
        );
        assert!("circle".parse::<GeometryType>().is_err());
    }

    #[test]
    fn empty_point_has_no_geo_types_value() {
        assert!(SfGeometry::EmptyPoint.to_geo().is_none());
        assert!(GeometryType::Polygon.empty_geometry().to_geo().is_some());
    }
}
