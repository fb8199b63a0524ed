// Physics Engine - Impact Effects
// Scaling-law estimates of crater size, energy release and blast/thermal/seismic radii

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// =============================================================================
// PHYSICAL CONSTANTS (SI Units)
// =============================================================================

/// Joules per megaton of TNT
pub const JOULES_PER_MEGATON: f64 = 4.184e15;

/// Floor applied to sin(angle) so grazing impacts keep a usable energy
pub const MIN_ANGLE_SINE: f64 = 0.1;

/// Transient craters wider than this (m) collapse into complex craters
pub const COMPLEX_CRATER_THRESHOLD: f64 = 3500.0;

/// Crater scaling-law coefficient
const CRATER_SCALING_COEFFICIENT: f64 = 1.161;

const SIMPLE_CRATER_WIDENING: f64 = 1.16;
const COMPLEX_CRATER_WIDENING: f64 = 1.28;
const CRATER_DEPTH_RATIO: f64 = 0.19;

/// Accepted input ranges. Callers clamp into these before evaluation.
pub mod limits {
    pub const DIAMETER_M: (f64, f64) = (5.0, 100_000.0);
    pub const VELOCITY_KM_S: (f64, f64) = (1.0, 150.0);
    pub const ANGLE_DEG: (f64, f64) = (5.0, 90.0);
    pub const DENSITY_KG_M3: (f64, f64) = (500.0, 11_000.0);
}

// =============================================================================
// TERRAIN TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TerrainKind {
    #[default]
    Land,
    Water,
    Ice,
}

impl From<&str> for TerrainKind {
    fn from(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "water" | "ocean" => TerrainKind::Water,
            "ice" => TerrainKind::Ice,
            // Unknown keys behave as land
            _ => TerrainKind::Land,
        }
    }
}

impl From<String> for TerrainKind {
    fn from(key: String) -> Self {
        TerrainKind::from(key.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainProfile {
    pub label: &'static str,
    /// Target material density (kg/m³)
    pub target_density: f64,
    /// Fraction of the impact energy coupled into the target (0, 1]
    pub dampening_factor: f64,
}

const LAND: TerrainProfile = TerrainProfile {
    label: "Continental crust",
    target_density: 2500.0,
    dampening_factor: 1.0,
};

const WATER: TerrainProfile = TerrainProfile {
    label: "Ocean",
    target_density: 1000.0,
    dampening_factor: 0.78,
};

const ICE: TerrainProfile = TerrainProfile {
    label: "Ice sheet",
    target_density: 917.0,
    dampening_factor: 0.88,
};

impl TerrainKind {
    pub fn profile(self) -> &'static TerrainProfile {
        match self {
            TerrainKind::Land => &LAND,
            TerrainKind::Water => &WATER,
            TerrainKind::Ice => &ICE,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            TerrainKind::Land => "land",
            TerrainKind::Water => "water",
            TerrainKind::Ice => "ice",
        }
    }
}

// =============================================================================
// INPUT PARAMETERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactParameters {
    /// Impactor diameter (m)
    pub diameter: f64,
    /// Entry velocity (km/s)
    pub velocity: f64,
    /// Impact angle from horizontal (degrees)
    pub angle: f64,
    /// Bulk density (kg/m³)
    pub density: f64,
    pub terrain: TerrainKind,
}

impl ImpactParameters {
    /// Clamp every field into the accepted physical range.
    pub fn clamped(self) -> Self {
        Self {
            diameter: clamp_to(self.diameter, limits::DIAMETER_M),
            velocity: clamp_to(self.velocity, limits::VELOCITY_KM_S),
            angle: clamp_to(self.angle, limits::ANGLE_DEG),
            density: clamp_to(self.density, limits::DENSITY_KG_M3),
            terrain: self.terrain,
        }
    }
}

pub fn clamp_to(value: f64, (min, max): (f64, f64)) -> f64 {
    value.max(min).min(max)
}

// =============================================================================
// IMPACT RESULT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactResult {
    pub transient_crater_diameter: f64,
    pub final_crater_diameter: f64,
    pub crater_depth: f64,
    pub fireball_radius: f64,
    pub shockwave_radius: f64,
    pub severe_damage_radius: f64,
    pub wind_damage_radius: f64,
    pub window_damage_radius: f64,
    /// Peak wind speed (m/s)
    pub peak_wind: f64,
    pub richter_magnitude: f64,
    /// Effective energy in megatons of TNT
    pub energy_mt: f64,
    pub kinetic_energy_joules: f64,
    pub effective_energy_joules: f64,
}

/// Evaluate the impact scaling laws for pre-clamped parameters.
///
/// Hazard radii are nested by construction:
/// window >= wind >= severe, each at least 10% beyond the one inside it.
pub fn compute_impact(params: &ImpactParameters) -> ImpactResult {
    let terrain = params.terrain.profile();

    // Mass of a spherical impactor
    let volume = (PI / 6.0) * params.diameter.powi(3);
    let mass = volume * params.density;

    let velocity_ms = params.velocity * 1000.0;
    let kinetic_energy = 0.5 * mass * velocity_ms * velocity_ms;

    let sin_angle = params.angle.to_radians().sin().max(MIN_ANGLE_SINE);
    let effective_energy = kinetic_energy * sin_angle * terrain.dampening_factor;

    let transient_crater_diameter = CRATER_SCALING_COEFFICIENT
        * (velocity_ms * sin_angle).powf(0.44)
        * (params.density / terrain.target_density).powf(0.333)
        * params.diameter.powf(0.78);

    let widening = if transient_crater_diameter > COMPLEX_CRATER_THRESHOLD {
        COMPLEX_CRATER_WIDENING
    } else {
        SIMPLE_CRATER_WIDENING
    };
    let final_crater_diameter = transient_crater_diameter * widening;
    let crater_depth = final_crater_diameter * CRATER_DEPTH_RATIO;

    let energy_mt = effective_energy / JOULES_PER_MEGATON;

    let fireball_radius = energy_mt.powf(0.4) * 1300.0;
    let shockwave_radius = energy_mt.powf(0.33) * 4000.0;

    let severe_damage_radius = (shockwave_radius * 0.35).max(final_crater_diameter * 0.4);
    let wind_damage_radius = (shockwave_radius * 0.58).max(severe_damage_radius * 1.1);
    let window_damage_radius = (shockwave_radius * 1.25).max(wind_damage_radius * 1.1);

    let peak_wind = energy_mt.powf(0.28) * 120.0;
    let richter_magnitude = effective_energy.log10() - 4.8;

    ImpactResult {
        transient_crater_diameter,
        final_crater_diameter,
        crater_depth,
        fireball_radius,
        shockwave_radius,
        severe_damage_radius,
        wind_damage_radius,
        window_damage_radius,
        peak_wind,
        richter_magnitude,
        energy_mt,
        kinetic_energy_joules: kinetic_energy,
        effective_energy_joules: effective_energy,
    }
}

/// Area of a circle with the given radius in meters, in km².
pub fn area_km2(radius_meters: f64) -> f64 {
    if !radius_meters.is_finite() || radius_meters <= 0.0 {
        return 0.0;
    }
    let radius_km = radius_meters / 1000.0;
    PI * radius_km * radius_km
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn reference_params() -> ImpactParameters {
        ImpactParameters {
            diameter: 1000.0,
            velocity: 20.0,
            angle: 45.0,
            density: 3300.0,
            terrain: TerrainKind::Land,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let result = compute_impact(&reference_params());

        for value in [
            result.final_crater_diameter,
            result.fireball_radius,
            result.shockwave_radius,
            result.richter_magnitude,
        ] {
            assert!(value.is_finite() && value > 0.0);
        }
        assert!(result.window_damage_radius > result.shockwave_radius);

        // 1 km stony impactor at 20 km/s: ~58 000 Mt, complex crater
        assert!((result.energy_mt - 58_400.0).abs() / 58_400.0 < 0.01);
        assert!(result.transient_crater_diameter > COMPLEX_CRATER_THRESHOLD);
        assert!(
            (result.final_crater_diameter / result.transient_crater_diameter - 1.28).abs() < 1e-12
        );
        assert!((result.crater_depth - result.final_crater_diameter * 0.19).abs() < 1e-9);
    }

    #[test]
    fn test_simple_crater_widening() {
        let params = ImpactParameters {
            diameter: 20.0,
            ..reference_params()
        };
        let result = compute_impact(&params);
        assert!(result.transient_crater_diameter <= COMPLEX_CRATER_THRESHOLD);
        assert!(
            (result.final_crater_diameter / result.transient_crater_diameter - 1.16).abs() < 1e-12
        );
    }

    #[test]
    fn test_crater_grows_with_diameter() {
        let mut previous = 0.0;
        for diameter in [5.0, 50.0, 200.0, 1000.0, 5000.0, 20_000.0, 100_000.0] {
            let result = compute_impact(&ImpactParameters {
                diameter,
                ..reference_params()
            });
            assert!(
                result.final_crater_diameter > previous,
                "crater did not grow at d={}",
                diameter
            );
            previous = result.final_crater_diameter;
        }
    }

    #[test]
    fn test_water_absorbs_energy() {
        let land = compute_impact(&reference_params());
        let water = compute_impact(&ImpactParameters {
            terrain: TerrainKind::Water,
            ..reference_params()
        });
        assert!(water.energy_mt < land.energy_mt);
        assert!((water.energy_mt / land.energy_mt - 0.78).abs() < 1e-12);
    }

    #[test]
    fn test_grazing_angle_uses_sine_floor() {
        let grazing = compute_impact(&ImpactParameters {
            angle: 0.5,
            ..reference_params()
        });
        let floor = compute_impact(&ImpactParameters {
            angle: 5.74,
            ..reference_params()
        });
        assert!(grazing.energy_mt > 0.0);
        assert!((grazing.energy_mt / floor.energy_mt - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_unknown_terrain_is_land() {
        assert_eq!(TerrainKind::from("lava"), TerrainKind::Land);
        assert_eq!(TerrainKind::from("Water"), TerrainKind::Water);
        let parsed: TerrainKind = serde_json::from_str("\"glacier\"").unwrap();
        assert_eq!(parsed, TerrainKind::Land);
        let parsed: TerrainKind = serde_json::from_str("\"ice\"").unwrap();
        assert_eq!(parsed, TerrainKind::Ice);
    }

    #[test]
    fn test_clamping() {
        let params = ImpactParameters {
            diameter: 1.0,
            velocity: 400.0,
            angle: 0.0,
            density: 20_000.0,
            terrain: TerrainKind::Ice,
        }
        .clamped();
        assert_eq!(params.diameter, 5.0);
        assert_eq!(params.velocity, 150.0);
        assert_eq!(params.angle, 5.0);
        assert_eq!(params.density, 11_000.0);
    }

    #[test]
    fn test_radius_ordering_over_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x1a9c7);
        let terrains = [TerrainKind::Land, TerrainKind::Water, TerrainKind::Ice];

        for _ in 0..2000 {
            let params = ImpactParameters {
                diameter: rng.gen_range(5.0..100_000.0),
                velocity: rng.gen_range(1.0..150.0),
                angle: rng.gen_range(5.0..90.0),
                density: rng.gen_range(500.0..11_000.0),
                terrain: terrains[rng.gen_range(0..terrains.len())],
            };
            let r = compute_impact(&params);

            assert!(r.window_damage_radius >= r.wind_damage_radius, "{:?}", params);
            assert!(r.wind_damage_radius >= r.severe_damage_radius, "{:?}", params);
            assert!(r.energy_mt > 0.0 && r.shockwave_radius > 0.0);
        }
    }

    #[test]
    fn test_area_km2() {
        assert!((area_km2(1000.0) - PI).abs() < 1e-12);
        assert_eq!(area_km2(0.0), 0.0);
        assert_eq!(area_km2(f64::NAN), 0.0);
    }
}
