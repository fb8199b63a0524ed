// Footprint Builder - Hazard rings with display stats
// Rings are returned in fixed hazard order; consumers sort by radius.

use serde::{Deserialize, Serialize};

use crate::casualty_model::{CasualtyEstimate, Hazard, InfrastructureEstimate};
use crate::formatting;
use crate::physics_engine::ImpactResult;
use crate::tsunami_model::TsunamiResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootprintKind {
    Crater,
    Fireball,
    Severe,
    Wind,
    Shockwave,
    Tsunami,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Distance,
    Depth,
    People,
    Currency,
    Energy,
    Speed,
    Magnitude,
    Height,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintStat {
    pub label: String,
    pub value: String,
    pub kind: StatKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footprint {
    #[serde(rename = "type")]
    pub kind: FootprintKind,
    pub title: String,
    pub description: String,
    pub label: String,
    pub radius_meters: f64,
    pub stats: Vec<FootprintStat>,
}

/// A footprint prepared for concentric rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring<'a> {
    pub footprint: &'a Footprint,
    pub outer_radius: f64,
    pub inner_radius: f64,
}

// =============================================================================
// STATS
// =============================================================================

fn stat(label: &str, raw: f64, kind: StatKind) -> Option<FootprintStat> {
    if !raw.is_finite() {
        return None;
    }
    let value = match kind {
        StatKind::Distance | StatKind::Depth => formatting::distance(raw),
        StatKind::People => formatting::people(raw),
        StatKind::Currency => formatting::usd(raw),
        StatKind::Energy => formatting::energy_mt(raw),
        StatKind::Speed => format!("{} m/s", formatting::group_thousands(raw)),
        StatKind::Magnitude => format!("{:.1}", raw),
        StatKind::Height => format!("{:.1} m", raw),
        StatKind::Duration => formatting::minutes(raw),
    };
    Some(FootprintStat {
        label: label.to_string(),
        value,
        kind,
    })
}

fn hazard_stats(casualties: &CasualtyEstimate, hazard: Hazard) -> [Option<FootprintStat>; 2] {
    let entry = casualties.get(hazard);
    [
        stat("Exposed population", entry.exposed, StatKind::People),
        stat("Estimated fatalities", entry.fatalities, StatKind::People),
    ]
}

// =============================================================================
// BUILDER
// =============================================================================

fn ring_radius(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        0.0
    }
}

fn footprint<I>(
    kind: FootprintKind,
    title: &str,
    description: String,
    raw_radius: f64,
    stats: I,
) -> Footprint
where
    I: IntoIterator<Item = Option<FootprintStat>>,
{
    let radius_meters = ring_radius(raw_radius);
    let label = if radius_meters > 0.0 {
        format!("{} ({} km)", title, formatting::km_figure(radius_meters))
    } else {
        title.to_string()
    };
    Footprint {
        kind,
        title: title.to_string(),
        description,
        label,
        radius_meters,
        stats: stats.into_iter().flatten().collect(),
    }
}

pub fn build_footprints(
    impact: &ImpactResult,
    casualties: &CasualtyEstimate,
    infrastructure: &InfrastructureEstimate,
    tsunami: Option<&TsunamiResult>,
) -> Vec<Footprint> {
    let mut footprints = Vec::with_capacity(6);

    footprints.push(footprint(
        FootprintKind::Crater,
        "Crater",
        "Ground is excavated and ejected; nothing inside the rim survives.".to_string(),
        impact.final_crater_diameter / 2.0,
        [
            stat("Crater diameter", impact.final_crater_diameter, StatKind::Distance),
            stat("Crater depth", impact.crater_depth, StatKind::Depth),
            stat("Energy released", impact.energy_mt, StatKind::Energy),
        ],
    ));

    let [exposed, fatalities] = hazard_stats(casualties, Hazard::Fireball);
    footprints.push(footprint(
        FootprintKind::Fireball,
        "Fireball",
        "Thermal radiation ignites clothing and buildings and causes third-degree burns."
            .to_string(),
        impact.fireball_radius,
        [
            stat("Fireball radius", impact.fireball_radius, StatKind::Distance),
            exposed,
            fatalities,
        ],
    ));

    let [exposed, fatalities] = hazard_stats(casualties, Hazard::Blast);
    footprints.push(footprint(
        FootprintKind::Severe,
        "Severe blast damage",
        "Overpressure flattens most residential and commercial structures.".to_string(),
        infrastructure.severe_damage_radius,
        [
            exposed,
            fatalities,
            stat("Economic loss", infrastructure.economic_loss, StatKind::Currency),
        ],
    ));

    let [exposed, fatalities] = hazard_stats(casualties, Hazard::Wind);
    footprints.push(footprint(
        FootprintKind::Wind,
        "Hurricane-force winds",
        "Winds stronger than a category 5 hurricane topple trees and strip roofs.".to_string(),
        impact.wind_damage_radius,
        [
            stat("Peak wind speed", impact.peak_wind, StatKind::Speed),
            exposed,
            fatalities,
        ],
    ));

    let [exposed, fatalities] = hazard_stats(casualties, Hazard::Seismic);
    footprints.push(footprint(
        FootprintKind::Shockwave,
        "Shockwave",
        "The air blast shatters windows while ground shaking is felt across the region."
            .to_string(),
        infrastructure.window_damage_radius,
        [
            stat("Seismic magnitude", impact.richter_magnitude, StatKind::Magnitude),
            stat("Shockwave radius", impact.shockwave_radius, StatKind::Distance),
            exposed,
            fatalities,
        ],
    ));

    if let Some(tsunami) = tsunami {
        footprints.push(footprint(
            FootprintKind::Tsunami,
            "Tsunami inundation",
            format!(
                "A {:.1} m wave reaches the coast about {} after impact.",
                tsunami.coastal_wave_height,
                formatting::minutes(tsunami.arrival_time_minutes)
            ),
            tsunami.inundation_distance_km * 1000.0,
            [
                stat("Coastal wave height", tsunami.coastal_wave_height, StatKind::Height),
                stat("Run-up height", tsunami.runup_height, StatKind::Height),
                stat("Arrival time", tsunami.arrival_time_minutes, StatKind::Duration),
                stat("Exposed population", tsunami.exposed_population, StatKind::People),
                stat("Estimated fatalities", tsunami.fatalities, StatKind::People),
            ],
        ));
    }

    footprints
}

/// Drop empty footprints and order the rest outermost first; each ring's
/// inner edge is the next smaller footprint's radius.
pub fn renderable_rings(footprints: &[Footprint]) -> Vec<Ring<'_>> {
    let mut visible: Vec<&Footprint> = footprints
        .iter()
        .filter(|f| f.radius_meters > 0.0)
        .collect();
    visible.sort_by(|a, b| b.radius_meters.total_cmp(&a.radius_meters));

    visible
        .iter()
        .enumerate()
        .map(|(i, &footprint)| Ring {
            footprint,
            outer_radius: footprint.radius_meters,
            inner_radius: visible.get(i + 1).map(|f| f.radius_meters).unwrap_or(0.0),
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
