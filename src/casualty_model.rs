// Casualty Model - Exposed population, fatalities and economic loss per hazard ring
// Population is treated as uniformly spread at an effective density.

use serde::{Deserialize, Serialize};

use crate::physics_engine::{area_km2, ImpactResult};

/// USD lost per fatality before density and infrastructure scaling
const LOSS_PER_FATALITY_USD: f64 = 4_200_000.0;

// =============================================================================
// POPULATION CONTEXT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationContext {
    /// People living within `radius_km`
    pub total: f64,
    /// People per km²
    pub density: f64,
    /// Radius the population figure was sampled over
    pub radius_km: f64,
}

impl PopulationContext {
    /// Sanitize a collaborator-supplied context: non-finite or negative totals
    /// become 0, density is floored at `density_floor`, radius at 1 km.
    pub fn sanitized(total: f64, density: f64, radius_km: f64, density_floor: f64) -> Self {
        let total = if total.is_finite() { total.max(0.0) } else { 0.0 };
        let density = if density.is_finite() {
            density.max(density_floor)
        } else {
            density_floor
        };
        let radius_km = if radius_km.is_finite() && radius_km > 0.0 {
            radius_km
        } else {
            1.0
        };
        Self {
            total,
            density,
            radius_km,
        }
    }
}

// =============================================================================
// HAZARDS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    Fireball,
    Blast,
    Wind,
    Seismic,
}

impl Hazard {
    pub const ALL: [Hazard; 4] = [Hazard::Fireball, Hazard::Blast, Hazard::Wind, Hazard::Seismic];

    /// Fraction of exposed people killed
    pub fn lethality(self) -> f64 {
        match self {
            Hazard::Fireball => 0.98,
            Hazard::Blast => 0.80,
            Hazard::Wind => 0.50,
            Hazard::Seismic => 0.15,
        }
    }

    /// Radius (m) of the ring this hazard covers
    pub fn radius(self, impact: &ImpactResult) -> f64 {
        match self {
            Hazard::Fireball => impact.fireball_radius,
            Hazard::Blast => impact.severe_damage_radius,
            Hazard::Wind => impact.wind_damage_radius,
            Hazard::Seismic => impact.shockwave_radius,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HazardCasualties {
    pub exposed: f64,
    pub fatalities: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CasualtyEstimate {
    pub fireball: HazardCasualties,
    pub blast: HazardCasualties,
    pub wind: HazardCasualties,
    pub seismic: HazardCasualties,
}

impl CasualtyEstimate {
    pub fn get(&self, hazard: Hazard) -> &HazardCasualties {
        match hazard {
            Hazard::Fireball => &self.fireball,
            Hazard::Blast => &self.blast,
            Hazard::Wind => &self.wind,
            Hazard::Seismic => &self.seismic,
        }
    }

    fn get_mut(&mut self, hazard: Hazard) -> &mut HazardCasualties {
        match hazard {
            Hazard::Fireball => &mut self.fireball,
            Hazard::Blast => &mut self.blast,
            Hazard::Wind => &mut self.wind,
            Hazard::Seismic => &mut self.seismic,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Hazard, &HazardCasualties)> {
        Hazard::ALL.into_iter().map(move |h| (h, self.get(h)))
    }

    pub fn total_fatalities(&self) -> f64 {
        self.iter().map(|(_, c)| c.fatalities).sum()
    }

    /// Rings overlap, so the widest exposure is the number of people affected.
    pub fn max_exposed(&self) -> f64 {
        self.iter().map(|(_, c)| c.exposed).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureEstimate {
    pub severe_damage_radius: f64,
    pub window_damage_radius: f64,
    /// USD
    pub economic_loss: f64,
}

// =============================================================================
// ESTIMATORS
// =============================================================================

/// The population figure casualties are capped at, if any.
pub fn explicit_population(
    population: &PopulationContext,
    override_total: Option<f64>,
) -> Option<f64> {
    match override_total {
        Some(v) if v.is_finite() && v > 0.0 => Some(v),
        _ if population.total.is_finite() && population.total > 0.0 => Some(population.total),
        _ => None,
    }
}

pub fn estimate_casualties(
    impact: &ImpactResult,
    population: &PopulationContext,
    population_override: Option<f64>,
) -> CasualtyEstimate {
    let mut density = population.density.max(1.0);
    let explicit = explicit_population(population, population_override);

    let max_area = Hazard::ALL
        .iter()
        .map(|h| area_km2(h.radius(impact)))
        .fold(0.0, f64::max);

    // Spread an explicit population over at most the largest affected area
    if let Some(people) = explicit {
        if max_area > 0.0 {
            density = density.max(people / max_area);
        }
    }

    let mut estimate = CasualtyEstimate::default();
    for hazard in Hazard::ALL {
        let area = area_km2(hazard.radius(impact));
        if area <= 0.0 {
            continue;
        }
        let mut exposed = area * density;
        if let Some(cap) = explicit {
            exposed = exposed.min(cap);
        }
        *estimate.get_mut(hazard) = HazardCasualties {
            exposed,
            fatalities: exposed * hazard.lethality(),
        };
    }
    estimate
}

pub fn estimate_economic_loss(
    casualties: &CasualtyEstimate,
    population: &PopulationContext,
    impact: &ImpactResult,
) -> f64 {
    let fatalities = casualties.total_fatalities();
    let density_factor = (population.density / 100.0).max(0.2);
    let severe_km = impact.severe_damage_radius / 1000.0;
    let infrastructure_factor = (1.0 + severe_km * 12.0).ln();

    let loss = fatalities * LOSS_PER_FATALITY_USD * density_factor * infrastructure_factor;
    if loss.is_finite() {
        loss.max(0.0)
    } else {
        0.0
    }
}

pub fn estimate_infrastructure(
    casualties: &CasualtyEstimate,
    population: &PopulationContext,
    impact: &ImpactResult,
) -> InfrastructureEstimate {
    InfrastructureEstimate {
        severe_damage_radius: impact.severe_damage_radius,
        window_damage_radius: impact.window_damage_radius,
        economic_loss: estimate_economic_loss(casualties, population, impact),
    }
}

// =============================================================================
// TESTS
// =============================================================================
