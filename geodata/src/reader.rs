//! Lecture des jeux de données vecteur via GDAL/OGR
//!
//! Tous les formats gérés par OGR sont lisibles (Shapefile, FileGDB via
//! OpenFileGDB, GeoJSON, GeoPackage, ...). Les données sont copiées dans une
//! [`FeatureCollection`] en types `geo`.

use std::path::Path;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{FieldValue, Layer, LayerAccess, OGRFieldType};
use gdal::Dataset;
use tracing::{debug, warn};

use crate::error::{GeodataError, Result};
use crate::types::{AttributeValue, Crs, Feature, FeatureCollection, FieldDef, FieldKind};

/// Ouvre un jeu de données, en vérifiant d'abord que le chemin existe
fn open(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(GeodataError::NotFound(path.to_path_buf()));
    }
    Ok(Dataset::open(path)?)
}

/// Liste les noms des couches vecteur d'un jeu de données
pub fn list_layers(path: &Path) -> Result<Vec<String>> {
    let dataset = open(path)?;
    let names: Vec<String> = dataset.layers().map(|layer| layer.name()).collect();
    debug!(path = %path.display(), count = names.len(), "Listed layers");
    Ok(names)
}

/// Charge une couche en mémoire
///
/// Sans nom de couche, la première couche du jeu de données est lue.
pub fn read(path: &Path, layer: Option<&str>) -> Result<FeatureCollection> {
    let dataset = open(path)?;

    let mut layer = match layer {
        Some(name) => dataset
            .layer_by_name(name)
            .map_err(|_| GeodataError::LayerNotFound {
                path: path.to_path_buf(),
                layer: name.to_string(),
            })?,
        None => dataset
            .layers()
            .next()
            .ok_or_else(|| GeodataError::NoLayer(path.to_path_buf()))?,
    };

    read_layer(&mut layer)
}

fn read_layer(layer: &mut Layer) -> Result<FeatureCollection> {
    let layer_name = layer.name();
    let crs = layer.spatial_ref().map(|srs| crs_from_spatial_ref(&srs)).transpose()?;

    let fields: Vec<FieldDef> = layer
        .defn()
        .fields()
        .map(|field| FieldDef::new(field.name(), field_kind(field.field_type())))
        .collect();

    debug!(
        layer = %layer_name,
        crs = ?crs.as_ref().map(|c| c.to_string()),
        fields = fields.len(),
        "Reading layer"
    );

    let mut features = Vec::new();
    for feature in layer.features() {
        let fid = feature.fid();

        let geometry = match feature.geometry() {
            Some(geom) => match geo::Geometry::<f64>::try_from(geom) {
                Ok(g) => Some(g),
                Err(e) => {
                    warn!(layer = %layer_name, fid = ?fid, "Unreadable geometry loaded as null: {}", e);
                    None
                }
            },
            None => None,
        };

        let attributes = feature
            .fields()
            .map(|(_, value)| attribute_value(value))
            .collect();

        features.push(Feature {
            fid,
            geometry,
            attributes,
        });
    }

    Ok(FeatureCollection {
        layer_name,
        crs,
        fields,
        features,
    })
}

/// Identifiant du CRS : `AUTH:CODE` si l'autorité est connue, WKT sinon
fn crs_from_spatial_ref(srs: &SpatialRef) -> Result<Crs> {
    if let (Ok(name), Ok(code)) = (srs.auth_name(), srs.auth_code()) {
        return Crs::parse(&format!("{}:{}", name, code));
    }
    Crs::parse(&srs.to_wkt()?)
}

fn field_kind(field_type: OGRFieldType::Type) -> FieldKind {
    match field_type {
        OGRFieldType::OFTInteger | OGRFieldType::OFTInteger64 => FieldKind::Integer,
        OGRFieldType::OFTReal => FieldKind::Real,
        OGRFieldType::OFTDate => FieldKind::Date,
        OGRFieldType::OFTDateTime => FieldKind::DateTime,
        OGRFieldType::OFTIntegerList | OGRFieldType::OFTInteger64List => FieldKind::IntegerList,
        OGRFieldType::OFTRealList => FieldKind::RealList,
        OGRFieldType::OFTStringList => FieldKind::StringList,
        // OFTString, OFTTime, OFTBinary...
        _ => FieldKind::String,
    }
}

fn attribute_value(value: Option<FieldValue>) -> AttributeValue {
    match value {
        None => AttributeValue::Null,
        Some(FieldValue::IntegerValue(v)) => AttributeValue::Integer(v as i64),
        Some(FieldValue::Integer64Value(v)) => AttributeValue::Integer(v),
        Some(FieldValue::RealValue(v)) => AttributeValue::Real(v),
        Some(FieldValue::StringValue(v)) => AttributeValue::String(v),
        Some(FieldValue::DateValue(d)) => AttributeValue::Date(d.to_string()),
        Some(FieldValue::DateTimeValue(dt)) => AttributeValue::DateTime(dt.to_rfc3339()),
        Some(FieldValue::IntegerListValue(v)) => {
            AttributeValue::IntegerList(v.into_iter().map(i64::from).collect())
        }
        Some(FieldValue::Integer64ListValue(v)) => AttributeValue::IntegerList(v),
        Some(FieldValue::RealListValue(v)) => AttributeValue::RealList(v),
        Some(FieldValue::StringListValue(v)) => AttributeValue::StringList(v),
        #[allow(unreachable_patterns)]
        Some(other) => other
            .into_string()
            .map(AttributeValue::String)
            .unwrap_or(AttributeValue::Null),
    }
}
