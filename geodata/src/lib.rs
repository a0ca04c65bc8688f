//! # geodata
//!
//! Chargement de couches vecteur (Shapefile, FileGDB, GeoJSON, GeoPackage...)
//! en mémoire via GDAL/OGR, et réduction de précision des géométries.
//!
//! ## Features
//!
//! - Lecture de tous les formats vecteur OGR, couche nommée ou première couche
//! - Liste des couches d'un conteneur multi-couches
//! - Types `geo` pour l'interopérabilité avec l'écosystème Rust géospatial
//! - Accrochage des coordonnées sur une grille décimale
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geodata::{list_layers, read, set_collection_precision};
//! use std::path::Path;
//!
//! for name in list_layers(Path::new("data.gpkg"))? {
//!     println!("{}", name);
//! }
//!
//! let mut collection = read(Path::new("data.gpkg"), Some("parcels"))?;
//! let stats = set_collection_precision(&mut collection, 7);
//! println!("{} features, {} collapsed", collection.len(), stats.collapsed);
//! ```

pub mod error;
pub mod precision;
pub mod reader;
pub mod types;

pub use error::GeodataError;
pub use precision::{set_collection_precision, set_precision, PrecisionStats};
pub use reader::{list_layers, read};
pub use types::{AttributeValue, Crs, Feature, FeatureCollection, FieldDef, FieldKind};
