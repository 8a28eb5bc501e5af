//! GeoJSON rendering of a result set for map clients.

use crate::upstream::StudentResult;
use serde::Serialize;
use serde_json::{json, Map, Value};

// Decorative marker properties expected by the map frontend.
const MARKER_COLOR: &str = "6ee86e";
const MARKER_WEIGHT: u32 = 10;

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    kind: &'static str,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: Geometry,
    properties: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    // GeoJSON coordinate order: longitude first, then latitude.
    coordinates: [f64; 2],
}

/// Map every record to a point feature, preserving upstream order.
pub fn feature_collection(result: &StudentResult) -> FeatureCollection {
    let features = result
        .data
        .iter()
        .map(|record| {
            let m = &record.attributes;
            let mut properties = Map::new();
            properties.insert("date".to_string(), json!(m.date));
            properties.insert("pmTen".to_string(), json!(m.pm_ten));
            properties.insert("pmTwoFive".to_string(), json!(m.pm_two_five));
            properties.insert("humidity".to_string(), json!(m.humidity));
            properties.insert("temperature".to_string(), json!(m.temperature));
            properties.insert("color".to_string(), json!(MARKER_COLOR));
            properties.insert("weight".to_string(), json!(MARKER_WEIGHT));

            Feature {
                kind: "Feature",
                geometry: Geometry {
                    kind: "Point",
                    coordinates: [m.longitude, m.latitude],
                },
                properties,
            }
        })
        .collect();

    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}
