//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

#[cfg(feature = "reproject")]
use anyhow::{Context, Result};
#[cfg(feature = "reproject")]
use geo::{
    Coord, Geometry, GeometryCollection, Line, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
#[cfg(feature = "reproject")]
use geodata::Crs;
#[cfg(feature = "reproject")]
use proj::Proj;

/// Reprojection de géométries entre deux systèmes de coordonnées
#[cfg(feature = "reproject")]
pub struct Reprojector {
    /// None pour la transformation identité
    proj: Option<Proj>,
    source: Crs,
    target: Crs,
}

#[cfg(feature = "reproject")]
impl Reprojector {
    /// Crée un nouveau reprojector entre deux CRS
    ///
    /// PROJ est normalisé pour l'affichage : x = longitude/est, y = latitude/nord.
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        if source.is_same_as(target) {
            // Pas besoin de reprojection
            return Ok(Self {
                proj: None,
                source: source.clone(),
                target: target.clone(),
            });
        }

        let proj = Proj::new_known_crs(source.definition(), target.definition(), None)
            .context(format!(
                "Failed to create projection from {} to {}",
                source, target
            ))?;

        Ok(Self {
            proj: Some(proj),
            source: source.clone(),
            target: target.clone(),
        })
    }

    /// Retourne le CRS source
    pub fn source(&self) -> &Crs {
        &self.source
    }

    /// Retourne le CRS cible
    pub fn target(&self) -> &Crs {
        &self.target
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    /// Transforme une géométrie
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        let Some(proj) = &self.proj else {
            return Ok(geom.clone());
        };

        match geom {
            Geometry::Point(p) => {
                let (x, y) = transform_coord(proj, p.0)?;
                Ok(Geometry::Point(Point::new(x, y)))
            }
            Geometry::Line(l) => {
                let start = transform_coord(proj, l.start)?;
                let end = transform_coord(proj, l.end)?;
                Ok(Geometry::Line(Line::new(start, end)))
            }
            Geometry::LineString(ls) => {
                let transformed = transform_linestring(proj, ls)?;
                Ok(Geometry::LineString(transformed))
            }
            Geometry::Polygon(p) => {
                let transformed = transform_polygon(proj, p)?;
                Ok(Geometry::Polygon(transformed))
            }
            Geometry::MultiPoint(mp) => {
                let points: Result<Vec<Point>> =
                    mp.0.iter()
                        .map(|p| {
                            let (x, y) = transform_coord(proj, p.0)?;
                            Ok(Point::new(x, y))
                        })
                        .collect();
                Ok(Geometry::MultiPoint(MultiPoint::new(points?)))
            }
            Geometry::MultiLineString(mls) => {
                let lines: Result<Vec<LineString>> = mls
                    .0
                    .iter()
                    .map(|ls| transform_linestring(proj, ls))
                    .collect();
                Ok(Geometry::MultiLineString(MultiLineString::new(lines?)))
            }
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>> =
                    mp.0.iter().map(|p| transform_polygon(proj, p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            Geometry::GeometryCollection(gc) => {
                let geoms: Result<Vec<Geometry>> =
                    gc.0.iter().map(|g| self.transform_geometry(g)).collect();
                Ok(Geometry::GeometryCollection(GeometryCollection::new_from(
                    geoms?,
                )))
            }
            // Un rectangle ou triangle reprojeté n'est plus axis-aligned
            Geometry::Rect(r) => Ok(Geometry::Polygon(transform_polygon(proj, &r.to_polygon())?)),
            Geometry::Triangle(t) => {
                Ok(Geometry::Polygon(transform_polygon(proj, &t.to_polygon())?))
            }
        }
    }
}

/// Transforme une coordonnée unique
#[cfg(feature = "reproject")]
fn transform_coord(proj: &Proj, coord: Coord) -> Result<(f64, f64)> {
    proj.convert((coord.x, coord.y))
        .context("Coordinate transformation failed")
}

/// Transforme une LineString (batch conversion)
#[cfg(feature = "reproject")]
fn transform_linestring(proj: &Proj, ls: &LineString) -> Result<LineString> {
    // Copier les coordonnées pour transformation in-place
    let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

    proj.convert_array(&mut coords)
        .context("Batch coordinate transformation failed")?;

    let result: Vec<Coord> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
    Ok(LineString::new(result))
}

/// Transforme un Polygon
#[cfg(feature = "reproject")]
fn transform_polygon(proj: &Proj, p: &Polygon) -> Result<Polygon> {
    let exterior = transform_linestring(proj, p.exterior())?;
    let interiors: Result<Vec<LineString>> = p
        .interiors()
        .iter()
        .map(|ls| transform_linestring(proj, ls))
        .collect();
    Ok(Polygon::new(exterior, interiors?))
}


// Implémentation factice quand le feature reproject est désactivé
#[cfg(not(feature = "reproject"))]
use anyhow::{bail, Result};
#[cfg(not(feature = "reproject"))]
use geo::Geometry;
#[cfg(not(feature = "reproject"))]
use geodata::Crs;

/// Reprojector factice - seule l'identité est disponible
#[cfg(not(feature = "reproject"))]
pub struct Reprojector {
    source: Crs,
    target: Crs,
}

#[cfg(not(feature = "reproject"))]
impl Reprojector {
    /// Tente de créer un reprojector - échoue sauf pour l'identité
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        if source.is_same_as(target) {
            Ok(Self {
                source: source.clone(),
                target: target.clone(),
            })
        } else {
            bail!(
                "Reprojection from {} to {} requires the 'reproject' feature. \
                 Build with: cargo build --features reproject",
                source,
                target
            )
        }
    }

    pub fn source(&self) -> &Crs {
        &self.source
    }

    pub fn target(&self) -> &Crs {
        &self.target
    }

    pub fn is_identity(&self) -> bool {
        true
    }

    /// Retourne la géométrie inchangée (pas de reprojection)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry> {
        Ok(geom.clone())
    }
}
