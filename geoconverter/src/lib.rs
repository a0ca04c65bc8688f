//! # geoconverter
//!
//! Conversion de fichiers géographiques vecteur entre formats, avec
//! reprojection et réduction de précision des coordonnées.
//!
//! ## Features
//!
//! - Lecture de tout format OGR (Shapefile, FileGDB, GeoJSON, GeoPackage...)
//! - Reprojection PROJ (feature `reproject`, active par défaut)
//! - Arrondi des coordonnées sur une grille décimale
//! - Écriture Shapefile, GeoJSON (streaming geozero) ou GeoPackage
//!
//! ## Usage CLI
//!
//! ```bash
//! # Lister les couches d'un conteneur
//! geoconverter --layers --file cadastre.gpkg
//!
//! # Convertir une couche en GeoJSON WGS84, 7 décimales
//! geoconverter --file cadastre.gdb --layer parcelles --output parcelles
//!
//! # Shapefile Lambert-93 arrondi au centimètre
//! geoconverter -f in.geojson -o out --format .shp --crs epsg:2154 --round 2
//! ```

pub mod cli;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod report;

pub use config::{ConvertOptions, OutputFormat};
pub use pipeline::Stage;
pub use report::ConversionReport;
