//! Steel profile catalog: JSON-backed, loaded once, treated as immutable.
//!
//! Catalog shape mirrors the wider corpus's read-only reference-table
//! pattern: a list of single-key objects keyed by profile name, each
//! holding one or more shape descriptors with a synonym list for lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FeaError, Result};
use crate::model::Section;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeEntry {
    pub shape_coords: Vec<f64>,
    pub shape_name: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// One catalog row: `{ "HEA 200": [ { shape_coords, shape_name, synonyms } ] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow(pub HashMap<String, Vec<ShapeEntry>>);

/// A resolved steel profile: section properties derived from its shape
/// descriptor, plus mass per metre for the optimizer's `weight` criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub section: Section,
    pub mass_per_metre: f64,
}

/// The loaded, name/synonym-indexed catalog.
#[derive(Debug, Clone, Default)]
pub struct SteelCatalog {
    profiles: Vec<Profile>,
    name_index: HashMap<String, usize>,
}

impl SteelCatalog {
    pub fn from_rows(rows: Vec<CatalogRow>, density: f64) -> Result<Self> {
        let mut catalog = Self::default();
        for row in rows {
            for (name, entries) in row.0 {
                let entry = entries
                    .first()
                    .ok_or_else(|| FeaError::InvalidInput(format!("catalog entry {name} has no shapes")))?;
                let profile = shape_to_profile(&name, entry, density)?;
                catalog.insert(profile, &entry.synonyms);
            }
        }
        Ok(catalog)
    }

    pub fn from_json(json: &str, density: f64) -> Result<Self> {
        let rows: Vec<CatalogRow> = serde_json::from_str(json)?;
        Self::from_rows(rows, density)
    }

    fn insert(&mut self, profile: Profile, synonyms: &[String]) {
        let idx = self.profiles.len();
        self.name_index.insert(profile.name.clone(), idx);
        for syn in synonyms {
            self.name_index.insert(syn.clone(), idx);
        }
        self.profiles.push(profile);
    }

    pub fn find(&self, name_or_synonym: &str) -> Result<&Profile> {
        self.name_index
            .get(name_or_synonym)
            .map(|&idx| &self.profiles[idx])
            .ok_or_else(|| FeaError::CatalogMiss(name_or_synonym.to_string()))
    }

    /// Profiles sorted ascending by `I_y`, the order the optimizer walks.
    pub fn sorted_by_iy(&self) -> Vec<&Profile> {
        let mut profiles: Vec<&Profile> = self.profiles.iter().collect();
        profiles.sort_by(|a, b| a.section.iy.partial_cmp(&b.section.iy).unwrap());
        profiles
    }

    pub fn filtered_series<'a>(&'a self, series_prefix: &str) -> Vec<&'a Profile> {
        self.sorted_by_iy()
            .into_iter()
            .filter(|p| p.name.starts_with(series_prefix))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Interprets `shape_coords` for the I-shape-parallel-flange family
/// (`[h, b, t_w, t_f, r]`, metres) into full section properties. Other
/// `shape_name` families are not needed by this engine's scope.
fn shape_to_profile(name: &str, entry: &ShapeEntry, density: f64) -> Result<Profile> {
    if entry.shape_coords.len() < 4 {
        return Err(FeaError::InvalidInput(format!(
            "catalog entry {name} has insufficient shape coordinates"
        )));
    }
    let h = entry.shape_coords[0];
    let b = entry.shape_coords[1];
    let tw = entry.shape_coords[2];
    let tf = entry.shape_coords[3];
    let r = entry.shape_coords.get(4).copied().unwrap_or(0.0);

    let hw = h - 2.0 * tf;
    let area = 2.0 * b * tf + hw * tw + (4.0 - std::f64::consts::PI) * r * r;
    let iy = (b * h.powi(3) - (b - tw) * hw.powi(3)) / 12.0;
    let iz = (2.0 * tf * b.powi(3) + hw * tw.powi(3)) / 12.0;
    let wel_y = iy / (h / 2.0);
    let wel_z = iz / (b / 2.0);
    let wpl_y = b * tf * (h - tf) + tw * hw * hw / 4.0;
    let wpl_z = tf * b * b / 2.0 + hw * tw * tw / 4.0;

    let section = Section {
        area,
        iy,
        iz,
        wel_y,
        wel_z,
        wpl_y,
        wpl_z,
        h,
        b: Some(b),
        tw: Some(tw),
        tf: Some(tf),
    };

    Ok(Profile {
        name: name.to_string(),
        section,
        mass_per_metre: area * density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"[
            { "IPE 200": [ { "shape_coords": [0.2, 0.1, 0.0056, 0.0085, 0.012], "shape_name": "i-parallel-flange", "synonyms": ["IPE200"] } ] },
            { "IPE 220": [ { "shape_coords": [0.22, 0.11, 0.0059, 0.0092, 0.012], "shape_name": "i-parallel-flange", "synonyms": [] } ] }
        ]"#
    }

    #[test]
    fn synonym_resolves_to_same_entry() {
        let catalog = SteelCatalog::from_json(sample_json(), 7850.0).unwrap();
        let by_name = catalog.find("IPE 200").unwrap();
        let by_synonym = catalog.find("IPE200").unwrap();
        assert_eq!(by_name, by_synonym);
    }

    #[test]
    fn unknown_profile_is_catalog_miss() {
        let catalog = SteelCatalog::from_json(sample_json(), 7850.0).unwrap();
        assert!(matches!(catalog.find("HEA 999"), Err(FeaError::CatalogMiss(_))));
    }

    #[test]
    fn sorted_by_iy_is_ascending() {
        let catalog = SteelCatalog::from_json(sample_json(), 7850.0).unwrap();
        let sorted = catalog.sorted_by_iy();
        assert!(sorted[0].section.iy <= sorted[1].section.iy);
    }
}
