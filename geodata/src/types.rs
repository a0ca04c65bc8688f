//! Types de données pour le crate geodata

use std::fmt;
use std::str::FromStr;

use geo::Geometry;
use serde::Serialize;

use crate::GeodataError;

/// Collection de features chargée en mémoire depuis une couche vecteur
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    /// Nom de la couche source
    pub layer_name: String,

    /// Système de coordonnées de la géométrie active (absent si non défini)
    pub crs: Option<Crs>,

    /// Schéma attributaire, dans l'ordre de la couche source
    pub fields: Vec<FieldDef>,

    /// Enregistrements
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Nombre d'enregistrements
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Nombre d'enregistrements sans géométrie
    pub fn null_geometries(&self) -> usize {
        self.features.iter().filter(|f| f.geometry.is_none()).count()
    }

    /// Itère sur les paires (champ, valeur) d'une feature
    pub fn properties<'a>(
        &'a self,
        feature: &'a Feature,
    ) -> impl Iterator<Item = (&'a FieldDef, &'a AttributeValue)> + 'a {
        self.fields.iter().zip(feature.attributes.iter())
    }
}

/// Un enregistrement : attributs + une géométrie active
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifiant de la feature dans la source (FID)
    pub fid: Option<u64>,

    /// Géométrie active (None pour une géométrie nulle)
    pub geometry: Option<Geometry>,

    /// Valeurs attributaires, alignées sur `FeatureCollection::fields`
    pub attributes: Vec<AttributeValue>,
}

/// Définition d'un champ attributaire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Type d'un champ attributaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Integer,
    Real,
    String,
    Date,
    DateTime,
    IntegerList,
    RealList,
    StringList,
}

/// Valeur attributaire
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Integer(i64),
    Real(f64),
    String(String),
    /// Date ISO 8601 (YYYY-MM-DD)
    Date(String),
    /// Date-heure RFC 3339
    DateTime(String),
    IntegerList(Vec<i64>),
    RealList(Vec<f64>),
    StringList(Vec<String>),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// Identifiant de système de coordonnées
///
/// Les codes `autorité:code` sont normalisés avec l'autorité en majuscules
/// (`epsg:4326` devient `EPSG:4326`). Toute autre définition non vide (WKT,
/// chaîne PROJ) est conservée telle quelle et interprétée par PROJ/GDAL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Crs {
    definition: String,
}

impl Crs {
    /// Analyse un identifiant de CRS saisi par l'utilisateur
    pub fn parse(input: &str) -> Result<Self, GeodataError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(GeodataError::invalid_crs(input, "empty definition"));
        }

        if let Some((auth, code)) = split_authority(trimmed) {
            return Ok(Self {
                definition: format!("{}:{}", auth.to_ascii_uppercase(), code),
            });
        }

        Ok(Self {
            definition: trimmed.to_string(),
        })
    }

    /// CRS EPSG
    pub fn epsg(code: u32) -> Self {
        Self {
            definition: format!("EPSG:{}", code),
        }
    }

    /// CRS WGS84 géographique (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::epsg(4326)
    }

    /// Définition utilisable par PROJ et GDAL
    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Couple (autorité, code) si la définition est de la forme `AUTH:CODE`
    pub fn authority(&self) -> Option<(&str, &str)> {
        split_authority(&self.definition)
    }

    /// Code EPSG si la définition en est un
    pub fn epsg_code(&self) -> Option<u32> {
        match self.authority() {
            Some((auth, code)) if auth.eq_ignore_ascii_case("EPSG") => code.parse().ok(),
            _ => None,
        }
    }

    /// Même identifiant (comparaison insensible à la casse)
    pub fn is_same_as(&self, other: &Crs) -> bool {
        self.definition.eq_ignore_ascii_case(&other.definition)
    }
}

impl FromStr for Crs {
    type Err = GeodataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition)
    }
}

/// Découpe `AUTH:CODE` (autorité alphabétique, code alphanumérique sans espace)
fn split_authority(s: &str) -> Option<(&str, &str)> {
    let (auth, code) = s.split_once(':')?;
    let auth_ok = !auth.is_empty() && auth.chars().all(|c| c.is_ascii_alphabetic());
    let code_ok = !code.is_empty() && code.chars().all(|c| c.is_ascii_alphanumeric());
    if auth_ok && code_ok {
        Some((auth, code))
    } else {
        None
    }
}
