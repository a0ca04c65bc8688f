//! Export vers GeoJSON avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

use geodata::{Crs, Feature, FeatureCollection};

/// Exporte une collection en GeoJSON (streaming avec geozero)
pub fn export_to_geojson(collection: &FeatureCollection, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    write_collection(&mut writer, collection)?;
    writer.flush()?;

    Ok(())
}

/// Écrit la FeatureCollection complète
fn write_collection<W: Write>(writer: &mut W, collection: &FeatureCollection) -> Result<()> {
    write!(writer, r#"{{"type":"FeatureCollection","name":"#)?;
    serde_json::to_writer(&mut *writer, &collection.layer_name)?;

    // Membre crs hérité, uniquement hors WGS84 (RFC 7946 implique EPSG:4326)
    let urn = collection
        .crs
        .as_ref()
        .filter(|c| c.epsg_code() != Some(4326))
        .and_then(crs_urn);
    if let Some(urn) = urn {
        write!(
            writer,
            r#","crs":{{"type":"name","properties":{{"name":"#
        )?;
        serde_json::to_writer(&mut *writer, &urn)?;
        write!(writer, "}}}}")?;
    }

    write!(writer, r#","features":["#)?;
    for (i, feature) in collection.features.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(writer, collection, feature)?;
    }
    write!(writer, "]}}")?;

    Ok(())
}

/// URN OGC `AUTH::code` ; aucune pour une chaîne PROJ ou un WKT
fn crs_urn(crs: &Crs) -> Option<String> {
    crs.authority()
        .map(|(auth, code)| format!("urn:ogc:def:crs:{}::{}", auth, code))
}

/// Écrit une feature en GeoJSON
fn write_feature<W: Write>(
    writer: &mut W,
    collection: &FeatureCollection,
    feature: &Feature,
) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","#)?;
    if let Some(fid) = feature.fid {
        write!(writer, r#""id":{},"#, fid)?;
    }

    // Geometry via geozero
    write!(writer, r#""geometry":"#)?;
    match &feature.geometry {
        Some(geometry) => {
            let mut geom_buf = Vec::new();
            let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
            geometry.process_geom(&mut geom_writer)?;
            writer.write_all(&geom_buf)?;
        }
        None => write!(writer, "null")?,
    }

    // Properties
    write!(writer, r#","properties":{{"#)?;
    for (i, (field, value)) in collection.properties(feature).enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        serde_json::to_writer(&mut *writer, &field.name)?;
        write!(writer, ":")?;
        serde_json::to_writer(&mut *writer, value)?;
    }
    write!(writer, "}}}}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, Point};
    use geodata::{AttributeValue, FieldDef, FieldKind};
    use std::io::Cursor;

    fn sample_collection(crs: Crs) -> FeatureCollection {
        FeatureCollection {
            layer_name: "places".to_string(),
            crs: Some(crs),
            fields: vec![
                FieldDef::new("name", FieldKind::String),
                FieldDef::new("population", FieldKind::Integer),
            ],
            features: vec![
                Feature {
                    fid: Some(1),
                    geometry: Some(Geometry::Point(Point::new(5.0, 47.0))),
                    attributes: vec![
                        AttributeValue::String("Test \"quoted\"".to_string()),
                        AttributeValue::Integer(42),
                    ],
                },
                Feature {
                    fid: None,
                    geometry: None,
                    attributes: vec![AttributeValue::Null, AttributeValue::Null],
                },
            ],
        }
    }

    #[test]
    fn test_write_feature() {
        let collection = sample_collection(Crs::wgs84());

        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, &collection, &collection.features[0]).unwrap();

        let json = String::from_utf8(buffer.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["id"], 1);
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(value["properties"]["name"], "Test \"quoted\"");
        assert_eq!(value["properties"]["population"], 42);
    }

    #[test]
    fn test_write_null_geometry() {
        let collection = sample_collection(Crs::wgs84());

        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, &collection, &collection.features[1]).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer.into_inner()).unwrap();
        assert!(value["geometry"].is_null());
        assert!(value.get("id").is_none());
        assert!(value["properties"]["name"].is_null());
    }

    #[test]
    fn test_crs_member_only_outside_wgs84() {
        let mut buffer = Vec::new();
        write_collection(&mut buffer, &sample_collection(Crs::wgs84())).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert!(value.get("crs").is_none());

        let mut buffer = Vec::new();
        write_collection(&mut buffer, &sample_collection(Crs::epsg(2154))).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(
            value["crs"]["properties"]["name"],
            "urn:ogc:def:crs:EPSG::2154"
        );
    }

    #[test]
    fn test_crs_member_for_other_authorities() {
        let mut buffer = Vec::new();
        write_collection(&mut buffer, &sample_collection(Crs::parse("esri:102100").unwrap()))
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(
            value["crs"]["properties"]["name"],
            "urn:ogc:def:crs:ESRI::102100"
        );

        // Une chaîne PROJ n'a pas d'URN : pas de membre crs
        let proj_string = Crs::parse("+proj=longlat +datum=WGS84 +no_defs").unwrap();
        let mut buffer = Vec::new();
        write_collection(&mut buffer, &sample_collection(proj_string)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert!(value.get("crs").is_none());
    }

    #[test]
    fn test_export_to_geojson() {
        let collection = sample_collection(Crs::wgs84());

        let temp_dir = std::env::temp_dir();
        let output_path = temp_dir.join("test_geoconverter_export.geojson");

        export_to_geojson(&collection, &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        let parsed: geojson::GeoJson = content.parse().unwrap();
        let geojson::GeoJson::FeatureCollection(fc) = parsed else {
            panic!("Expected FeatureCollection");
        };
        assert_eq!(fc.features.len(), 2);

        std::fs::remove_file(output_path).ok();
    }
}
