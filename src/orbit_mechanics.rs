// Orbit Mechanics - Kepler propagation for orbit visualization
// Heliocentric ecliptic frame, distances in AU, angles in degrees at the boundary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Gaussian gravitational constant expressed as mean motion at 1 AU (deg/day)
pub const GAUSS_MEAN_MOTION_DEG_PER_DAY: f64 = 0.985_607_668_6;

/// Julian Date of the Unix epoch
pub const UNIX_EPOCH_JULIAN: f64 = 2_440_587.5;

/// J2000.0 (2000-01-01 12:00 TT)
pub const J2000_JULIAN: f64 = 2_451_545.0;

pub const MAX_ECCENTRICITY: f64 = 0.999_999;

const KEPLER_TOLERANCE: f64 = 1e-6;
const KEPLER_MAX_ITERATIONS: u32 = 30;

// =============================================================================
// KEPLERIAN ORBITAL ELEMENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitalElements {
    pub semi_major_axis_au: f64,
    /// Elliptical orbits only, clamped to [0, MAX_ECCENTRICITY]
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub ascending_node_deg: f64,
    pub arg_perihelion_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Osculation epoch (Julian Date)
    pub epoch_julian: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_motion_deg_per_day: Option<f64>,
}

impl OrbitalElements {
    pub fn clamped_eccentricity(&self) -> f64 {
        if self.eccentricity.is_finite() {
            self.eccentricity.clamp(0.0, MAX_ECCENTRICITY)
        } else {
            0.0
        }
    }

    /// Mean motion from the catalog, else from the period, else Kepler's third law.
    pub fn mean_motion(&self) -> f64 {
        if let Some(n) = self.mean_motion_deg_per_day.filter(|n| n.is_finite() && *n > 0.0) {
            return n;
        }
        if let Some(p) = self.period_days.filter(|p| p.is_finite() && *p > 0.0) {
            return 360.0 / p;
        }
        GAUSS_MEAN_MOTION_DEG_PER_DAY / self.semi_major_axis_au.abs().max(1e-6).powf(1.5)
    }

    pub fn perihelion_au(&self) -> f64 {
        self.semi_major_axis_au * (1.0 - self.clamped_eccentricity())
    }

    pub fn aphelion_au(&self) -> f64 {
        self.semi_major_axis_au * (1.0 + self.clamped_eccentricity())
    }
}

// =============================================================================
// KEPLER'S EQUATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly (radians)
    pub eccentric_anomaly: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Solve M = E - e*sin(E) using Newton-Raphson.
///
/// Seeds with E = M for e < 0.8 and E = π above, and stops after
/// 30 iterations even if the 1e-6 tolerance was not reached.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
    let m = mean_anomaly.rem_euclid(TAU);
    let mut e_anom = if eccentricity < 0.8 { m } else { PI };

    for iteration in 1..=KEPLER_MAX_ITERATIONS {
        let f = e_anom - eccentricity * e_anom.sin() - m;
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        let delta = f / f_prime;
        e_anom -= delta;

        if delta.abs() < KEPLER_TOLERANCE {
            return KeplerSolution {
                eccentric_anomaly: e_anom,
                iterations: iteration,
                converged: true,
            };
        }
    }

    KeplerSolution {
        eccentric_anomaly: e_anom,
        iterations: KEPLER_MAX_ITERATIONS,
        converged: false,
    }
}

// =============================================================================
// PROPAGATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyState {
    /// True anomaly (radians)
    pub true_anomaly: f64,
    pub radius_au: f64,
    /// Mean anomaly at the requested date (radians, [0, 2π))
    pub mean_anomaly: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

/// Advance the mean anomaly from the epoch to `julian_date` and locate the body.
pub fn propagate_true_anomaly(elements: &OrbitalElements, julian_date: f64) -> AnomalyState {
    let e = elements.clamped_eccentricity();
    let elapsed_days = julian_date - elements.epoch_julian;
    let mean_anomaly = (elements.mean_anomaly_deg + elements.mean_motion() * elapsed_days)
        .to_radians()
        .rem_euclid(TAU);

    let eccentric_anomaly = solve_kepler(mean_anomaly, e).eccentric_anomaly;

    let true_anomaly = 2.0
        * ((1.0 + e).sqrt() * (eccentric_anomaly / 2.0).sin())
            .atan2((1.0 - e).sqrt() * (eccentric_anomaly / 2.0).cos());

    // Distance from focus
    let radius_au = elements.semi_major_axis_au * (1.0 - e * eccentric_anomaly.cos());

    AnomalyState {
        true_anomaly,
        radius_au,
        mean_anomaly,
    }
}

/// Rotate the orbital-plane radius vector at true anomaly `nu` (radians)
/// into the heliocentric ecliptic frame.
pub fn orbital_position_from_true_anomaly(elements: &OrbitalElements, nu: f64) -> OrbitalPosition {
    let e = elements.clamped_eccentricity();
    let a = elements.semi_major_axis_au;
    let r = a * (1.0 - e * e) / (1.0 + e * nu.cos());

    // Position in orbital plane (perifocal frame)
    let x_orb = r * nu.cos();
    let y_orb = r * nu.sin();

    let (sin_node, cos_node) = elements.ascending_node_deg.to_radians().sin_cos();
    let (sin_w, cos_w) = elements.arg_perihelion_deg.to_radians().sin_cos();
    let (sin_i, cos_i) = elements.inclination_deg.to_radians().sin_cos();

    // Combined rotation matrix elements
    let r11 = cos_node * cos_w - sin_node * sin_w * cos_i;
    let r12 = -cos_node * sin_w - sin_node * cos_w * cos_i;
    let r21 = sin_node * cos_w + cos_node * sin_w * cos_i;
    let r22 = -sin_node * sin_w + cos_node * cos_w * cos_i;
    let r31 = sin_w * sin_i;
    let r32 = cos_w * sin_i;

    OrbitalPosition {
        x: r11 * x_orb + r12 * y_orb,
        y: r21 * x_orb + r22 * y_orb,
        z: r31 * x_orb + r32 * y_orb,
        radius: r,
    }
}

/// Evenly spaced points around the full ellipse, for drawing the orbit path.
pub fn sample_orbit_path(elements: &OrbitalElements, points: usize) -> Vec<OrbitalPosition> {
    let points = points.max(3);
    (0..points)
        .map(|i| {
            let nu = TAU * i as f64 / points as f64;
            orbital_position_from_true_anomaly(elements, nu)
        })
        .collect()
}

pub fn julian_date(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + UNIX_EPOCH_JULIAN
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn earth_like() -> OrbitalElements {
        OrbitalElements {
            semi_major_axis_au: 1.0,
            eccentricity: 0.0,
            inclination_deg: 0.0,
            ascending_node_deg: 0.0,
            arg_perihelion_deg: 0.0,
            mean_anomaly_deg: 0.0,
            epoch_julian: J2000_JULIAN,
            period_days: None,
            mean_motion_deg_per_day: None,
        }
    }

    #[test]
    fn test_kepler_equation_circular() {
        // For circular orbit e=0, E = M
        let solution = solve_kepler(1.0, 0.0);
        assert!(solution.converged);
        assert!((solution.eccentric_anomaly - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kepler_equation_eccentric() {
        let solution = solve_kepler(2.0, 0.6);
        let e = solution.eccentric_anomaly;
        assert!(solution.converged);
        assert!(solution.iterations <= 30);
        assert!((e - 0.6 * e.sin() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_kepler_high_eccentricity_seeds_at_pi() {
        for m in [0.01, 0.5, 3.0, 6.0] {
            let solution = solve_kepler(m, 0.97);
            let e = solution.eccentric_anomaly;
            assert!(solution.converged, "no convergence for M={}", m);
            assert!((e - 0.97 * e.sin() - m).abs() < 1e-6);
        }
    }

    #[test]
    fn test_circular_orbit_propagates_uniformly() {
        let elements = earth_like();
        let quarter_year = 365.256_363 / 4.0;
        let state = propagate_true_anomaly(&elements, J2000_JULIAN + quarter_year);
        assert!((state.radius_au - 1.0).abs() < 1e-9);
        assert!((state.true_anomaly - PI / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_mean_motion_sources() {
        let mut elements = earth_like();
        assert!((elements.mean_motion() - GAUSS_MEAN_MOTION_DEG_PER_DAY).abs() < 1e-12);
        elements.period_days = Some(720.0);
        assert!((elements.mean_motion() - 0.5).abs() < 1e-12);
        elements.mean_motion_deg_per_day = Some(0.25);
        assert!((elements.mean_motion() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_position_at_perihelion_and_aphelion() {
        let elements = OrbitalElements {
            semi_major_axis_au: 2.0,
            eccentricity: 0.5,
            ..earth_like()
        };
        let peri = orbital_position_from_true_anomaly(&elements, 0.0);
        let aph = orbital_position_from_true_anomaly(&elements, PI);
        assert!((peri.radius - elements.perihelion_au()).abs() < 1e-12);
        assert!((aph.radius - elements.aphelion_au()).abs() < 1e-12);
        assert!((peri.x - 1.0).abs() < 1e-12);
        assert!((aph.x + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_preserves_radius_and_tilts_plane() {
        let elements = OrbitalElements {
            semi_major_axis_au: 1.46,
            eccentricity: 0.22,
            inclination_deg: 10.8,
            ascending_node_deg: 304.3,
            arg_perihelion_deg: 178.9,
            ..earth_like()
        };
        for nu in [0.0, 1.0, 2.5, 4.0] {
            let p = orbital_position_from_true_anomaly(&elements, nu);
            let norm = (p.x * p.x + p.y * p.y + p.z * p.z).sqrt();
            assert!((norm - p.radius).abs() < 1e-12);
        }
        let p = orbital_position_from_true_anomaly(&elements, 1.0);
        assert!(p.z.abs() > 1e-3);
    }

    #[test]
    fn test_radius_from_both_paths_agrees() {
        let elements = OrbitalElements {
            semi_major_axis_au: 0.92,
            eccentricity: 0.19,
            mean_anomaly_deg: 140.0,
            ..earth_like()
        };
        let state = propagate_true_anomaly(&elements, J2000_JULIAN + 40.0);
        let position = orbital_position_from_true_anomaly(&elements, state.true_anomaly);
        assert!((state.radius_au - position.radius).abs() < 1e-6);
    }

    #[test]
    fn test_eccentricity_clamped() {
        let elements = OrbitalElements {
            eccentricity: 1.4,
            ..earth_like()
        };
        assert_eq!(elements.clamped_eccentricity(), MAX_ECCENTRICITY);
        let state = propagate_true_anomaly(&elements, J2000_JULIAN + 10.0);
        assert!(state.radius_au.is_finite());
    }

    #[test]
    fn test_sample_orbit_path() {
        let path = sample_orbit_path(&earth_like(), 64);
        assert_eq!(path.len(), 64);
        assert!(path.iter().all(|p| (p.radius - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_julian_date() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date(j2000) - J2000_JULIAN).abs() < 1e-9);
    }
}
