// Summary Narrator - One-paragraph plain-language description of a scenario

use crate::casualty_model::{CasualtyEstimate, InfrastructureEstimate};
use crate::formatting;
use crate::physics_engine::{ImpactParameters, ImpactResult, TerrainKind};
use crate::tsunami_model::TsunamiResult;

pub struct SummaryContext<'a> {
    pub place: &'a str,
    pub params: &'a ImpactParameters,
    pub impact: &'a ImpactResult,
    pub casualties: &'a CasualtyEstimate,
    pub infrastructure: &'a InfrastructureEstimate,
    pub tsunami: Option<&'a TsunamiResult>,
}

fn surface_phrase(terrain: TerrainKind) -> &'static str {
    match terrain {
        TerrainKind::Land => "into solid ground",
        TerrainKind::Water => "into the ocean",
        TerrainKind::Ice => "into an ice sheet",
    }
}

pub fn compose_summary(ctx: &SummaryContext) -> String {
    let params = ctx.params;
    let impact = ctx.impact;
    let place = if ctx.place.trim().is_empty() {
        "the selected location"
    } else {
        ctx.place.trim()
    };

    let mut sentences = vec![format!(
        "A {} wide object striking {} at {:.1} km/s and {:.0}° {} releases about {}.",
        formatting::distance(params.diameter),
        place,
        params.velocity,
        params.angle,
        surface_phrase(params.terrain),
        formatting::energy_mt(impact.energy_mt),
    )];

    if impact.final_crater_diameter.is_finite() && impact.final_crater_diameter > 0.0 {
        sentences.push(format!(
            "It leaves a crater {} across and {} deep.",
            formatting::distance(impact.final_crater_diameter),
            formatting::distance(impact.crater_depth),
        ));
    }

    if impact.fireball_radius.is_finite() && impact.window_damage_radius.is_finite() {
        sentences.push(format!(
            "The fireball reaches {}, buildings collapse out to {} \
             and windows shatter as far as {}.",
            formatting::distance(impact.fireball_radius),
            formatting::distance(ctx.infrastructure.severe_damage_radius),
            formatting::distance(impact.window_damage_radius),
        ));
    }

    if impact.richter_magnitude.is_finite() {
        sentences.push(format!(
            "Ground shaking is comparable to a magnitude {:.1} earthquake.",
            impact.richter_magnitude
        ));
    }

    let fatalities = ctx.casualties.total_fatalities();
    let exposed = ctx.casualties.max_exposed();
    if exposed >= 1.0 {
        sentences.push(format!(
            "Roughly {} people are exposed, with an estimated {} fatalities \
             and {} in economic losses.",
            formatting::people(exposed),
            formatting::people(fatalities),
            formatting::usd(ctx.infrastructure.economic_loss),
        ));
    } else {
        sentences.push("Few or no people live within the affected area.".to_string());
    }

    if let Some(tsunami) = ctx.tsunami {
        sentences.push(format!(
            "A tsunami about {:.1} m high reaches the coast in {} \
             and floods up to {:.1} km inland.",
            tsunami.coastal_wave_height,
            formatting::minutes(tsunami.arrival_time_minutes),
            tsunami.inundation_distance_km,
        ));
    }

    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::casualty_model::{estimate_casualties, estimate_infrastructure, PopulationContext};
    use crate::physics_engine::compute_impact;

    #[test]
    fn test_summary_mentions_key_effects() {
        let params = ImpactParameters {
            diameter: 1000.0,
            velocity: 20.0,
            angle: 45.0,
            density: 3300.0,
            terrain: TerrainKind::Land,
        };
        let impact = compute_impact(&params);
        let population = PopulationContext {
            total: 0.0,
            density: 300.0,
            radius_km: 50.0,
        };
        let casualties = estimate_casualties(&impact, &population, None);
        let infrastructure = estimate_infrastructure(&casualties, &population, &impact);

        let summary = compose_summary(&SummaryContext {
            place: "Paris, France",
            params: &params,
            impact: &impact,
            casualties: &casualties,
            infrastructure: &infrastructure,
            tsunami: None,
        });

        assert!(summary.starts_with("A 1.0 km wide object striking Paris, France at 20.0 km/s"));
        assert!(summary.contains("megatons TNT"));
        assert!(summary.contains("magnitude"));
        assert!(summary.contains("fatalities"));
        assert!(!summary.contains("tsunami"));
    }

    #[test]
    fn test_summary_without_population() {
        let params = ImpactParameters {
            diameter: 20.0,
            velocity: 15.0,
            angle: 45.0,
            density: 3000.0,
            terrain: TerrainKind::Ice,
        };
        let impact = compute_impact(&params);
        let summary = compose_summary(&SummaryContext {
            place: " ",
            params: &params,
            impact: &impact,
            casualties: &CasualtyEstimate::default(),
            infrastructure: &InfrastructureEstimate {
                severe_damage_radius: impact.severe_damage_radius,
                window_damage_radius: impact.window_damage_radius,
                economic_loss: 0.0,
            },
            tsunami: None,
        });
        assert!(summary.contains("the selected location"));
        assert!(summary.contains("into an ice sheet"));
        assert!(summary.contains("Few or no people"));
    }
}
