//! Export via les drivers OGR (Shapefile, GeoPackage)

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{
    Feature as OgrFeature, FieldValue, LayerAccess, LayerOptions, OGRFieldType,
    OGRwkbGeometryType, ToGdal,
};
use gdal::DriverManager;
use geo::{Geometry, MultiLineString, MultiPoint, MultiPolygon};
use tracing::debug;

use geodata::{AttributeValue, FeatureCollection, FieldKind};

/// Exporte une collection avec le driver OGR donné (écrase la sortie existante)
pub fn export_with_driver(
    collection: &FeatureCollection,
    driver_name: &str,
    output_path: &Path,
) -> Result<()> {
    let driver = DriverManager::get_driver_by_name(driver_name)
        .context(format!("OGR driver not available: {}", driver_name))?;

    if output_path.exists() {
        driver
            .delete(output_path)
            .context(format!("Failed to replace existing {}", output_path.display()))?;
    }

    let mut dataset = driver
        .create_vector_only(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;

    let srs = collection
        .crs
        .as_ref()
        .map(|crs| SpatialRef::from_definition(crs.definition()))
        .transpose()
        .context("Failed to build output spatial reference")?;

    let layer_name = if collection.layer_name.is_empty() {
        output_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("layer")
            .to_string()
    } else {
        collection.layer_name.clone()
    };

    let geometry_type = layer_geometry_type(collection);
    debug!(layer = %layer_name, driver = driver_name, geometry_type, "Creating layer");

    let layer = dataset.create_layer(LayerOptions {
        name: &layer_name,
        srs: srs.as_ref(),
        ty: geometry_type,
        options: None,
    })?;

    let field_defs: Vec<(&str, OGRFieldType::Type)> = collection
        .fields
        .iter()
        .map(|f| (f.name.as_str(), ogr_field_type(f.kind)))
        .collect();
    layer.create_defn_fields(&field_defs)?;

    // Les drivers peuvent renommer les champs (troncature à 10 caractères en Shapefile)
    let created_names: Vec<String> = layer.defn().fields().map(|f| f.name()).collect();
    if created_names.len() != collection.fields.len() {
        anyhow::bail!(
            "Driver {} created {} fields out of {}",
            driver_name,
            created_names.len(),
            collection.fields.len()
        );
    }

    for feature in &collection.features {
        let mut ogr_feature = OgrFeature::new(layer.defn())?;

        if let Some(geometry) = &feature.geometry {
            let geometry = promote_to_multi(geometry, geometry_type);
            ogr_feature.set_geometry(geometry.to_gdal()?)?;
        }

        for (name, value) in created_names.iter().zip(feature.attributes.iter()) {
            if let Some(field_value) = ogr_field_value(value) {
                ogr_feature.set_field(name, &field_value)?;
            }
        }

        ogr_feature
            .create(&layer)
            .context(format!("Failed to write feature {:?}", feature.fid))?;
    }

    Ok(())
}

/// Type géométrique de la couche déduit des features
///
/// Type uniforme conservé ; mélange simple/multi d'une même famille promu en
/// multi ; sinon type inconnu.
fn layer_geometry_type(collection: &FeatureCollection) -> OGRwkbGeometryType::Type {
    let kinds: HashSet<OGRwkbGeometryType::Type> = collection
        .features
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .map(wkb_type)
        .collect();

    let mut kinds = kinds.into_iter().collect::<Vec<_>>();
    kinds.sort_unstable();

    match kinds.as_slice() {
        [] => OGRwkbGeometryType::wkbUnknown,
        [single] => *single,
        [a, b] => match (multi_of(*a), multi_of(*b)) {
            (Some(ma), Some(mb)) if ma == mb => ma,
            _ => OGRwkbGeometryType::wkbUnknown,
        },
        _ => OGRwkbGeometryType::wkbUnknown,
    }
}

/// Convertit une géométrie simple en multi quand la couche est de type multi
fn promote_to_multi(geom: &Geometry, layer_type: OGRwkbGeometryType::Type) -> Geometry {
    match (geom, layer_type) {
        (Geometry::Point(p), OGRwkbGeometryType::wkbMultiPoint) => {
            Geometry::MultiPoint(MultiPoint::new(vec![*p]))
        }
        (Geometry::LineString(ls), OGRwkbGeometryType::wkbMultiLineString) => {
            Geometry::MultiLineString(MultiLineString::new(vec![ls.clone()]))
        }
        (Geometry::Polygon(p), OGRwkbGeometryType::wkbMultiPolygon) => {
            Geometry::MultiPolygon(MultiPolygon::new(vec![p.clone()]))
        }
        _ => geom.clone(),
    }
}

fn wkb_type(geom: &Geometry) -> OGRwkbGeometryType::Type {
    match geom {
        Geometry::Point(_) => OGRwkbGeometryType::wkbPoint,
        Geometry::Line(_) | Geometry::LineString(_) => OGRwkbGeometryType::wkbLineString,
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {
            OGRwkbGeometryType::wkbPolygon
        }
        Geometry::MultiPoint(_) => OGRwkbGeometryType::wkbMultiPoint,
        Geometry::MultiLineString(_) => OGRwkbGeometryType::wkbMultiLineString,
        Geometry::MultiPolygon(_) => OGRwkbGeometryType::wkbMultiPolygon,
        Geometry::GeometryCollection(_) => OGRwkbGeometryType::wkbGeometryCollection,
    }
}

/// Type multi de la famille d'un type simple ou multi
fn multi_of(ty: OGRwkbGeometryType::Type) -> Option<OGRwkbGeometryType::Type> {
    match ty {
        OGRwkbGeometryType::wkbPoint | OGRwkbGeometryType::wkbMultiPoint => {
            Some(OGRwkbGeometryType::wkbMultiPoint)
        }
        OGRwkbGeometryType::wkbLineString | OGRwkbGeometryType::wkbMultiLineString => {
            Some(OGRwkbGeometryType::wkbMultiLineString)
        }
        OGRwkbGeometryType::wkbPolygon | OGRwkbGeometryType::wkbMultiPolygon => {
            Some(OGRwkbGeometryType::wkbMultiPolygon)
        }
        _ => None,
    }
}

fn ogr_field_type(kind: FieldKind) -> OGRFieldType::Type {
    match kind {
        FieldKind::Integer => OGRFieldType::OFTInteger64,
        FieldKind::Real => OGRFieldType::OFTReal,
        FieldKind::String => OGRFieldType::OFTString,
        FieldKind::Date => OGRFieldType::OFTDate,
        FieldKind::DateTime => OGRFieldType::OFTDateTime,
        FieldKind::IntegerList => OGRFieldType::OFTInteger64List,
        FieldKind::RealList => OGRFieldType::OFTRealList,
        FieldKind::StringList => OGRFieldType::OFTStringList,
    }
}

/// Valeur OGR ; les dates passent en texte ISO, OGR les analyse à l'écriture
fn ogr_field_value(value: &AttributeValue) -> Option<FieldValue> {
    match value {
        AttributeValue::Null => None,
        AttributeValue::Integer(v) => Some(FieldValue::Integer64Value(*v)),
        AttributeValue::Real(v) => Some(FieldValue::RealValue(*v)),
        AttributeValue::String(v) | AttributeValue::Date(v) | AttributeValue::DateTime(v) => {
            Some(FieldValue::StringValue(v.clone()))
        }
        AttributeValue::IntegerList(v) => Some(FieldValue::Integer64ListValue(v.clone())),
        AttributeValue::RealList(v) => Some(FieldValue::RealListValue(v.clone())),
        AttributeValue::StringList(v) => Some(FieldValue::StringListValue(v.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon, Point};
    use geodata::{Crs, Feature, FieldDef};

    fn collection_of(geometries: Vec<Geometry>) -> FeatureCollection {
        FeatureCollection {
            layer_name: "test".to_string(),
            crs: Some(Crs::wgs84()),
            fields: vec![],
            features: geometries
                .into_iter()
                .map(|g| Feature {
                    fid: None,
                    geometry: Some(g),
                    attributes: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_layer_geometry_type_uniform() {
        let c = collection_of(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::Point(Point::new(1.0, 1.0)),
        ]);
        assert_eq!(layer_geometry_type(&c), OGRwkbGeometryType::wkbPoint);
    }

    #[test]
    fn test_layer_geometry_type_promoted_to_multi() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let c = collection_of(vec![
            Geometry::Polygon(square.clone()),
            Geometry::MultiPolygon(MultiPolygon::new(vec![square])),
        ]);
        assert_eq!(layer_geometry_type(&c), OGRwkbGeometryType::wkbMultiPolygon);
    }

    #[test]
    fn test_layer_geometry_type_mixed() {
        let c = collection_of(vec![
            Geometry::Point(Point::new(0.0, 0.0)),
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)]),
        ]);
        assert_eq!(layer_geometry_type(&c), OGRwkbGeometryType::wkbUnknown);
        assert_eq!(
            layer_geometry_type(&collection_of(vec![])),
            OGRwkbGeometryType::wkbUnknown
        );
    }

    #[test]
    fn test_promote_to_multi() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let promoted = promote_to_multi(
            &Geometry::Polygon(square.clone()),
            OGRwkbGeometryType::wkbMultiPolygon,
        );
        assert_eq!(promoted, Geometry::MultiPolygon(MultiPolygon::new(vec![square.clone()])));

        let untouched = promote_to_multi(&Geometry::Polygon(square), OGRwkbGeometryType::wkbPolygon);
        assert!(matches!(untouched, Geometry::Polygon(_)));
    }

    #[test]
    fn test_field_value_mapping() {
        assert!(ogr_field_value(&AttributeValue::Null).is_none());
        assert!(matches!(
            ogr_field_value(&AttributeValue::Date("2024-01-31".to_string())),
            Some(FieldValue::StringValue(s)) if s == "2024-01-31"
        ));
        assert_eq!(ogr_field_type(FieldKind::Integer), OGRFieldType::OFTInteger64);
    }

    #[test]
    fn test_export_gpkg_roundtrip() {
        let mut collection = collection_of(vec![
            Geometry::Point(Point::new(2.35, 48.85)),
            Geometry::Point(Point::new(5.72, 45.18)),
        ]);
        collection.fields = vec![FieldDef::new("name", FieldKind::String)];
        collection.features[0].attributes = vec![AttributeValue::String("Paris".to_string())];
        collection.features[1].attributes = vec![AttributeValue::Null];

        let output_path = std::env::temp_dir().join("test_geoconverter_ogr.gpkg");
        export_with_driver(&collection, "GPKG", &output_path).unwrap();
        // Une seconde écriture remplace le fichier existant
        export_with_driver(&collection, "GPKG", &output_path).unwrap();

        let reread = geodata::read(&output_path, Some("test")).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread.crs.as_ref().and_then(|c| c.epsg_code()), Some(4326));
        assert_eq!(
            reread.features[0].attributes[0],
            AttributeValue::String("Paris".to_string())
        );

        std::fs::remove_file(output_path).ok();
    }
}
