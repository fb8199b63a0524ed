// Asteroid Catalog - Normalized asteroid records from NASA entries or offline presets
// Composition heuristics, friendly-name resolution and the embedded fallback catalog

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api_client::{parse_number, NeoObject};
use crate::error::{ImpactLabError, Result};
use crate::orbit_mechanics::OrbitalElements;
use crate::physics_engine::{clamp_to, limits};

const FALLBACK_CATALOG_JSON: &str = include_str!("../data/fallback_asteroids.json");

pub const DEFAULT_IMPACT_ANGLE_DEG: f64 = 45.0;
pub const DEFAULT_VELOCITY_KM_S: f64 = 20.0;
const DEFAULT_DIAMETER_M: f64 = 50.0;

/// Geometric albedo assumed when sizing from absolute magnitude
const ASSUMED_ALBEDO: f64 = 0.14;

// =============================================================================
// COMPOSITION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    Stony,
    Iron,
    Carbonaceous,
    Cometary,
    Unknown,
}

impl Composition {
    /// Bulk density (kg/m³)
    pub fn density(self) -> f64 {
        match self {
            Composition::Iron => 7800.0,
            Composition::Stony => 3300.0,
            Composition::Carbonaceous => 1800.0,
            Composition::Cometary => 600.0,
            Composition::Unknown => 3200.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Composition::Stony => "stony",
            Composition::Iron => "iron",
            Composition::Carbonaceous => "carbonaceous",
            Composition::Cometary => "cometary",
            Composition::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionHints<'a> {
    pub name: Option<&'a str>,
    pub orbit_class: Option<&'a str>,
    pub absolute_magnitude: Option<f64>,
    pub diameter_m: Option<f64>,
}

pub fn is_comet_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.starts_with("c/") || lower.starts_with("p/") || lower.contains("comet")
        // Numbered periodic comets: "1P/Halley"
        || lower
            .split_once("p/")
            .map(|(prefix, _)| !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
}

pub fn estimate_composition(hints: &CompositionHints) -> Composition {
    if hints.name.map(is_comet_name).unwrap_or(false) {
        return Composition::Cometary;
    }

    let magnitude = hints.absolute_magnitude.filter(|h| h.is_finite());
    let diameter = hints.diameter_m.filter(|d| d.is_finite());
    let near_earth_crosser = hints
        .orbit_class
        .map(|c| {
            let c = c.trim().to_uppercase();
            c.starts_with("ATE") || c.starts_with("APO")
        })
        .unwrap_or(false);

    if near_earth_crosser && magnitude.map(|h| h <= 17.5).unwrap_or(false) {
        return Composition::Iron;
    }
    if magnitude.map(|h| h >= 22.2).unwrap_or(false) {
        return Composition::Carbonaceous;
    }
    if let Some(d) = diameter {
        if d >= 1000.0 && magnitude.map(|h| h <= 19.5).unwrap_or(true) {
            return Composition::Iron;
        }
        if d <= 150.0 && magnitude.map(|h| h >= 21.0).unwrap_or(true) {
            return Composition::Carbonaceous;
        }
    }
    Composition::Stony
}

// =============================================================================
// NAME RESOLUTION
// =============================================================================

fn strip_trailing_parenthetical(s: &str) -> &str {
    let trimmed = s.trim_end();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            return trimmed[..open].trim_end();
        }
    }
    trimmed
}

fn trailing_parenthetical(s: &str) -> Option<&str> {
    let trimmed = s.trim_end();
    let inner = trimmed.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    Some(inner[open + 1..].trim())
}

/// "2004 MN4", "1999 RQ36": a four-digit year followed by a half-month code
fn is_provisional_designation(s: &str) -> bool {
    let mut parts = s.split_whitespace();
    let (Some(year), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    let mut code_chars = code.chars();
    year.len() == 4
        && year.chars().all(|c| c.is_ascii_digit())
        && code_chars.next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
        && code_chars.all(|c| c.is_ascii_alphanumeric())
}

/// Extract a human name from a catalog name, dropping designation tokens.
///
/// "(2023 XA) Apophis" -> "Apophis", "99942 Apophis (2004 MN4)" -> "Apophis",
/// "C/2020 F3 (NEOWISE)" -> "NEOWISE". Bare designations yield `None`.
pub fn derive_friendly_alias(name: &str) -> Option<String> {
    let s = name.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(rest) = s.strip_prefix('(') {
        let (_, after) = rest.split_once(')')?;
        let candidate = strip_trailing_parenthetical(after.trim());
        return (!candidate.is_empty()).then(|| candidate.to_string());
    }

    let base = strip_trailing_parenthetical(s);
    if is_provisional_designation(base) {
        return None;
    }

    if let Some((first, rest)) = base.split_once(char::is_whitespace) {
        let rest = rest.trim();
        if first.chars().all(|c| c.is_ascii_digit())
            && !rest.is_empty()
            && !is_provisional_designation(rest)
        {
            return Some(rest.to_string());
        }
    }

    if let Some(inner) = trailing_parenthetical(s) {
        if !inner.is_empty() && !inner.chars().any(|c| c.is_ascii_digit()) {
            return Some(inner.to_string());
        }
    }

    if !base.is_empty() && !base.chars().any(|c| c.is_ascii_digit()) {
        return Some(base.to_string());
    }
    None
}

/// Designation inside a catalog name: "433 Eros (A898 PA)" -> "A898 PA".
pub fn designation_from_name(name: &str) -> Option<String> {
    let s = name.trim();
    if let Some(rest) = s.strip_prefix('(') {
        return rest.split_once(')').map(|(d, _)| d.trim().to_string());
    }
    if let Some(inner) = trailing_parenthetical(s) {
        if inner.chars().any(|c| c.is_ascii_digit()) {
            return Some(inner.to_string());
        }
    }
    is_provisional_designation(s).then(|| s.to_string())
}

fn lookup_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Friendly names known from the offline presets, keyed by id, designation
/// and official name.
#[derive(Debug, Clone, Default)]
pub struct AliasLookup {
    aliases: HashMap<String, String>,
}

impl AliasLookup {
    pub fn from_presets(presets: &[FallbackPreset]) -> Self {
        let mut aliases = HashMap::new();
        for preset in presets {
            let Some(alias) = preset
                .alias
                .clone()
                .or_else(|| derive_friendly_alias(&preset.name))
            else {
                continue;
            };
            let keys = [
                Some(preset.id.as_str()),
                preset.designation.as_deref(),
                Some(preset.name.as_str()),
            ];
            for key in keys.into_iter().flatten() {
                aliases.insert(lookup_key(key), alias.clone());
            }
        }
        Self { aliases }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.aliases.get(&lookup_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

// =============================================================================
// ASTEROID RECORD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Nasa,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsteroidRecord {
    pub id: String,
    /// Display name: alias, else official name, else designation
    pub name: String,
    pub official_name: Option<String>,
    pub alias: Option<String>,
    pub designation: Option<String>,
    pub diameter: f64,
    pub diameter_min: f64,
    pub diameter_max: f64,
    /// km/s
    pub velocity: f64,
    pub impact_angle: f64,
    pub density: f64,
    pub absolute_magnitude: Option<f64>,
    pub composition: Composition,
    pub hazardous: bool,
    pub approach_date: Option<String>,
    pub approach_body: Option<String>,
    pub miss_distance_km: Option<f64>,
    pub orbit_class: Option<String>,
    pub source: RecordSource,
    /// Short blurb for curated offline presets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Diameter (m) implied by absolute magnitude at the assumed albedo.
pub fn diameter_from_magnitude(h: f64) -> f64 {
    1329.0 / ASSUMED_ALBEDO.sqrt() * 10f64.powf(-h / 5.0) * 1000.0
}

fn display_name(
    alias: Option<&str>,
    official: Option<&str>,
    designation: Option<&str>,
    id: &str,
) -> String {
    alias
        .or(official)
        .or(designation)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if id.trim().is_empty() {
                "Unnamed object".to_string()
            } else {
                format!("NEO-{}", id.trim())
            }
        })
}

fn clamp_diameter_range(diameter: f64, min: f64, max: f64) -> (f64, f64, f64) {
    let diameter = clamp_to(diameter, limits::DIAMETER_M);
    let min = clamp_to(min.min(diameter), limits::DIAMETER_M);
    let max = clamp_to(max.max(diameter), limits::DIAMETER_M);
    (diameter, min, max)
}

pub fn build_asteroid_record(neo: &NeoObject, aliases: &AliasLookup) -> AsteroidRecord {
    let official_name = Some(neo.name.trim().to_string()).filter(|n| !n.is_empty());
    let designation = neo
        .designation
        .clone()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| designation_from_name(&neo.name));

    let alias = aliases
        .get(&neo.id)
        .or_else(|| designation.as_deref().and_then(|d| aliases.get(d)))
        .or_else(|| aliases.get(&neo.name))
        .map(str::to_string)
        .or_else(|| derive_friendly_alias(&neo.name));

    let magnitude = neo.absolute_magnitude_h.filter(|h| h.is_finite());

    let meters = neo
        .estimated_diameter
        .as_ref()
        .and_then(|d| d.meters.as_ref());
    let (diameter, min, max) = match meters {
        Some(m) => (
            (m.estimated_diameter_min + m.estimated_diameter_max) / 2.0,
            m.estimated_diameter_min,
            m.estimated_diameter_max,
        ),
        None => {
            let d = magnitude.map(diameter_from_magnitude).unwrap_or(DEFAULT_DIAMETER_M);
            (d, d, d)
        }
    };
    let (diameter, diameter_min, diameter_max) = clamp_diameter_range(diameter, min, max);

    // Closest Earth approach on record
    let approach = neo
        .close_approach_data
        .iter()
        .filter(|ca| {
            ca.orbiting_body
                .as_deref()
                .map(|b| b.eq_ignore_ascii_case("earth"))
                .unwrap_or(true)
        })
        .map(|ca| {
            let miss = ca
                .miss_distance
                .as_ref()
                .and_then(|m| parse_number(m.kilometers.as_deref()));
            (ca, miss)
        })
        .min_by(|a, b| a.1.unwrap_or(f64::MAX).total_cmp(&b.1.unwrap_or(f64::MAX)));

    let velocity = approach
        .and_then(|(ca, _)| ca.relative_velocity.as_ref())
        .and_then(|v| parse_number(v.kilometers_per_second.as_deref()))
        .unwrap_or(DEFAULT_VELOCITY_KM_S);

    let orbit_class = neo.orbit_class_type().map(str::to_string);
    let composition = estimate_composition(&CompositionHints {
        name: Some(&neo.name),
        orbit_class: orbit_class.as_deref(),
        absolute_magnitude: magnitude,
        diameter_m: Some(diameter),
    });

    AsteroidRecord {
        id: neo.id.clone(),
        name: display_name(
            alias.as_deref(),
            official_name.as_deref(),
            designation.as_deref(),
            &neo.id,
        ),
        official_name,
        alias,
        designation,
        diameter,
        diameter_min,
        diameter_max,
        velocity: clamp_to(velocity, limits::VELOCITY_KM_S),
        impact_angle: DEFAULT_IMPACT_ANGLE_DEG,
        density: clamp_to(composition.density(), limits::DENSITY_KG_M3),
        absolute_magnitude: magnitude,
        composition,
        hazardous: neo.is_potentially_hazardous_asteroid.unwrap_or(false),
        approach_date: approach.and_then(|(ca, _)| ca.close_approach_date.clone()),
        approach_body: approach.and_then(|(ca, _)| ca.orbiting_body.clone()),
        miss_distance_km: approach.and_then(|(_, miss)| miss),
        orbit_class,
        source: RecordSource::Nasa,
        description: None,
    }
}

// =============================================================================
// OFFLINE PRESETS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetApproach {
    pub date: Option<String>,
    pub body: Option<String>,
    pub miss_distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackPreset {
    pub id: String,
    pub name: String,
    pub alias: Option<String>,
    pub designation: Option<String>,
    pub diameter_m: f64,
    pub diameter_min_m: Option<f64>,
    pub diameter_max_m: Option<f64>,
    pub velocity_km_s: Option<f64>,
    pub impact_angle_deg: Option<f64>,
    pub density: Option<f64>,
    pub absolute_magnitude: Option<f64>,
    pub composition: Option<Composition>,
    #[serde(default)]
    pub hazardous: bool,
    pub orbit_class: Option<String>,
    pub approach: Option<PresetApproach>,
    pub orbit: Option<OrbitalElements>,
    pub description: Option<String>,
}

pub fn build_fallback_asteroid_record(preset: &FallbackPreset) -> AsteroidRecord {
    let alias = preset
        .alias
        .clone()
        .filter(|a| !a.trim().is_empty())
        .or_else(|| derive_friendly_alias(&preset.name));
    let designation = preset
        .designation
        .clone()
        .or_else(|| designation_from_name(&preset.name));
    let official_name = Some(preset.name.trim().to_string()).filter(|n| !n.is_empty());

    let raw_diameter = if preset.diameter_m.is_finite() {
        preset.diameter_m
    } else {
        DEFAULT_DIAMETER_M
    };
    let (diameter, diameter_min, diameter_max) = clamp_diameter_range(
        raw_diameter,
        preset.diameter_min_m.unwrap_or(raw_diameter),
        preset.diameter_max_m.unwrap_or(raw_diameter),
    );

    let composition = preset.composition.unwrap_or_else(|| {
        estimate_composition(&CompositionHints {
            name: Some(&preset.name),
            orbit_class: preset.orbit_class.as_deref(),
            absolute_magnitude: preset.absolute_magnitude,
            diameter_m: Some(diameter),
        })
    });
    let density = preset
        .density
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or_else(|| composition.density());

    let approach = preset.approach.as_ref();

    AsteroidRecord {
        id: preset.id.clone(),
        name: display_name(
            alias.as_deref(),
            official_name.as_deref(),
            designation.as_deref(),
            &preset.id,
        ),
        official_name,
        alias,
        designation,
        diameter,
        diameter_min,
        diameter_max,
        velocity: clamp_to(
            preset.velocity_km_s.unwrap_or(DEFAULT_VELOCITY_KM_S),
            limits::VELOCITY_KM_S,
        ),
        impact_angle: clamp_to(
            preset.impact_angle_deg.unwrap_or(DEFAULT_IMPACT_ANGLE_DEG),
            limits::ANGLE_DEG,
        ),
        density: clamp_to(density, limits::DENSITY_KG_M3),
        absolute_magnitude: preset.absolute_magnitude,
        composition,
        hazardous: preset.hazardous,
        approach_date: approach.and_then(|a| a.date.clone()),
        approach_body: approach.and_then(|a| a.body.clone()),
        miss_distance_km: approach.and_then(|a| a.miss_distance_km),
        orbit_class: preset.orbit_class.clone(),
        source: RecordSource::Fallback,
        description: preset
            .description
            .as_ref()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    }
}

// =============================================================================
// FALLBACK CATALOG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilters {
    pub search: Option<String>,
    #[serde(default)]
    pub hazardous_only: bool,
}

impl CatalogFilters {
    pub fn matches(&self, record: &AsteroidRecord) -> bool {
        if self.hazardous_only && !record.hazardous {
            return false;
        }
        let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            return true;
        };
        let term = term.to_lowercase();
        [
            Some(record.id.as_str()),
            Some(record.name.as_str()),
            record.official_name.as_deref(),
            record.alias.as_deref(),
            record.designation.as_deref(),
            Some(record.composition.label()),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }
}

pub struct FallbackCatalog {
    presets: Vec<FallbackPreset>,
    records: Vec<AsteroidRecord>,
}

impl FallbackCatalog {
    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_json(FALLBACK_CATALOG_JSON)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let presets: Vec<FallbackPreset> = serde_json::from_str(raw)
            .map_err(|e| ImpactLabError::Config(format!("fallback catalog: {}", e)))?;
        let records = presets.iter().map(build_fallback_asteroid_record).collect();
        Ok(Self { presets, records })
    }

    pub fn aliases(&self) -> AliasLookup {
        AliasLookup::from_presets(&self.presets)
    }

    pub fn records(&self) -> &[AsteroidRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<(&FallbackPreset, &AsteroidRecord)> {
        let key = lookup_key(id);
        self.presets
            .iter()
            .zip(&self.records)
            .find(|(preset, record)| {
                let same =
                    |field: Option<&str>| field.map(lookup_key).as_deref() == Some(key.as_str());
                lookup_key(&preset.id) == key
                    || same(record.alias.as_deref())
                    || same(record.designation.as_deref())
            })
    }

    pub fn filtered(&self, filters: &CatalogFilters) -> Vec<AsteroidRecord> {
        self.records
            .iter()
            .filter(|r| filters.matches(r))
            .cloned()
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
