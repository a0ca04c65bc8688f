//! Modules d'export (GeoJSON, drivers OGR) et reprojection

pub mod geojson;
pub mod ogr;
pub mod reproject;

pub use reproject::Reprojector;
