// Tsunami Model - Wave height, run-up, arrival time and coastal casualties
// Only evaluated for oceanic impact points deeper than MIN_TSUNAMI_DEPTH_M.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::casualty_model::PopulationContext;
use crate::physics_engine::ImpactResult;

/// Water shallower than this (m) produces no tsunami
pub const MIN_TSUNAMI_DEPTH_M: f64 = 5.0;

/// Coastal distance assumed when the population context has no radius
const DEFAULT_TRAVEL_DISTANCE_KM: f64 = 60.0;

/// Depth used for arrival time under `ArrivalDepth::FixedShelf`
const FIXED_SHELF_DEPTH_M: f64 = 50.0;

const GRAVITY: f64 = 9.81;
const RUNUP_FACTOR: f64 = 1.35;
const TSUNAMI_LETHALITY: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OceanContext {
    pub depth_meters: Option<f64>,
    pub wave_height_meters: Option<f64>,
    pub wave_period_seconds: Option<f64>,
    pub surface_temperature_c: Option<f64>,
}

/// Which depth drives the shallow-water wave speed used for arrival time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrivalDepth {
    /// Resolved ocean depth at the impact point (at least 10 m)
    #[default]
    Resolved,
    /// Fixed 50 m continental-shelf depth
    FixedShelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsunamiOptions {
    /// Use `max(sqrt(depth_km + 0.05), 0.35)` rather than bare `sqrt(depth_km)`
    pub depth_floor: bool,
    pub arrival_depth: ArrivalDepth,
}

impl Default for TsunamiOptions {
    fn default() -> Self {
        Self {
            depth_floor: true,
            arrival_depth: ArrivalDepth::Resolved,
        }
    }
}

pub struct TsunamiInput<'a> {
    pub impact: &'a ImpactResult,
    pub ocean: &'a OceanContext,
    pub population: &'a PopulationContext,
    pub explicit_population: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsunamiResult {
    pub source_wave_height: f64,
    pub coastal_wave_height: f64,
    pub runup_height: f64,
    pub inundation_distance_km: f64,
    pub arrival_time_minutes: f64,
    pub travel_distance_km: f64,
    pub exposed_population: f64,
    pub fatalities: f64,
    pub ocean: OceanContext,
}

impl TsunamiResult {
    fn is_finite(&self) -> bool {
        [
            self.source_wave_height,
            self.coastal_wave_height,
            self.runup_height,
            self.inundation_distance_km,
            self.arrival_time_minutes,
            self.travel_distance_km,
            self.exposed_population,
            self.fatalities,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Estimate the tsunami for an oceanic impact. `None` is a normal outcome.
pub fn compute_tsunami_impact(
    input: &TsunamiInput,
    options: &TsunamiOptions,
) -> Option<TsunamiResult> {
    let depth_meters = input.ocean.depth_meters.filter(|d| d.is_finite())?;
    if depth_meters <= MIN_TSUNAMI_DEPTH_M {
        return None;
    }

    let impact = input.impact;
    let crater_radius_km = impact.final_crater_diameter / 2.0 / 1000.0;
    let energy_mt = impact.energy_mt.max(1.0);
    let energy_factor = energy_mt.powf(0.28);

    let depth_km = depth_meters / 1000.0;
    let depth_factor = if options.depth_floor {
        (depth_km + 0.05).sqrt().max(0.35)
    } else {
        depth_km.sqrt().max(f64::EPSILON)
    };

    let source_wave_height = (energy_factor * 6.0 / depth_factor).min(crater_radius_km * 800.0);

    let sampled_radius = Some(input.population.radius_km)
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or(DEFAULT_TRAVEL_DISTANCE_KM);
    let travel_distance_km = sampled_radius.max(crater_radius_km * 2.0 + 30.0);

    // Geometric spreading from the crater rim to the coast
    let spreading = crater_radius_km / travel_distance_km.max(crater_radius_km + 1.0);
    let coastal_wave_height = source_wave_height * spreading.powf(1.1);
    let runup_height = coastal_wave_height * RUNUP_FACTOR;
    let inundation_distance_km = (runup_height / 3.0).max(1.0) + coastal_wave_height / 5.0;

    let speed_depth = match options.arrival_depth {
        ArrivalDepth::Resolved => depth_meters.max(10.0),
        ArrivalDepth::FixedShelf => FIXED_SHELF_DEPTH_M,
    };
    let wave_speed = (GRAVITY * speed_depth).sqrt();
    let arrival_time_minutes = travel_distance_km * 1000.0 / wave_speed / 60.0;

    let mut exposed_population =
        PI * inundation_distance_km * inundation_distance_km * input.population.density.max(1.0);
    if let Some(cap) = input.explicit_population.filter(|p| p.is_finite() && *p > 0.0) {
        exposed_population = exposed_population.min(cap);
    }
    let fatalities = exposed_population * TSUNAMI_LETHALITY;

    let result = TsunamiResult {
        source_wave_height,
        coastal_wave_height,
        runup_height,
        inundation_distance_km,
        arrival_time_minutes,
        travel_distance_km,
        exposed_population,
        fatalities,
        ocean: *input.ocean,
    };
    result.is_finite().then_some(result)
}

// =============================================================================
// TESTS
// =============================================================================
