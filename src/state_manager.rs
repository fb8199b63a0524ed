// State Manager - Shared application state and simulation orchestration
// Resolves collaborators concurrently, then runs the pure impact pipeline

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::f64::consts::PI;
use std::sync::Arc;

use crate::api_client::{is_neo_id, parse_orbital_elements, BrowsePage, CatalogCache, NeoWsClient};
use crate::asteroid_catalog::{
    build_asteroid_record, AliasLookup, AsteroidRecord, CatalogFilters, FallbackCatalog,
    RecordSource,
};
use crate::casualty_model::{
    estimate_casualties, estimate_infrastructure, explicit_population, CasualtyEstimate,
    InfrastructureEstimate, PopulationContext,
};
use crate::config::Config;
use crate::error::{ImpactLabError, Result};
use crate::footprint_builder::{build_footprints, Footprint};
use crate::orbit_mechanics::{
    julian_date, orbital_position_from_true_anomaly, propagate_true_anomaly, sample_orbit_path,
    AnomalyState, OrbitalElements, OrbitalPosition,
};
use crate::physics_engine::{compute_impact, ImpactParameters, ImpactResult, TerrainKind};
use crate::summary_narrator::{compose_summary, SummaryContext};
use crate::tsunami_model::{
    compute_tsunami_impact, OceanContext, TsunamiInput, TsunamiOptions, TsunamiResult,
};

/// Radius (km) the heuristic population resolver pretends to have sampled
const HEURISTIC_SAMPLE_RADIUS_KM: f64 = 50.0;

/// Mean depth of the world ocean (m), used when no bathymetry is available
const MEAN_OCEAN_DEPTH_M: f64 = 3700.0;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 50;
const ORBIT_PATH_POINTS: usize = 128;
/// Widest approach window NeoWs serves in one feed request
const MAX_FEED_DAYS: i64 = 7;

// =============================================================================
// COLLABORATOR CONTRACTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationLookup {
    pub context: PopulationContext,
    pub source: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeologyProfile {
    pub label: String,
    pub elevation_meters: Option<f64>,
    pub surface_type: String,
    pub landcover: Option<String>,
    pub water_body: Option<String>,
    pub ocean: OceanContext,
    /// Reason the profile is a heuristic stand-in
    #[serde(rename = "fallback", skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[async_trait]
pub trait PopulationResolver: Send + Sync {
    async fn resolve(&self, location: &Location) -> Result<PopulationLookup>;
}

#[async_trait]
pub trait GeologyResolver: Send + Sync {
    async fn resolve(&self, location: &Location, terrain: TerrainKind) -> Result<GeologyProfile>;
}

/// Uniform density everywhere; used when no live population source exists.
pub struct HeuristicPopulation {
    pub density: f64,
}

impl HeuristicPopulation {
    pub fn lookup(&self, reason: &str) -> PopulationLookup {
        let context = PopulationContext::sanitized(
            self.density * PI * HEURISTIC_SAMPLE_RADIUS_KM * HEURISTIC_SAMPLE_RADIUS_KM,
            self.density,
            HEURISTIC_SAMPLE_RADIUS_KM,
            1.0,
        );
        PopulationLookup {
            context,
            source: "heuristic".to_string(),
            meta: json!({ "reason": reason }),
        }
    }
}

#[async_trait]
impl PopulationResolver for HeuristicPopulation {
    async fn resolve(&self, _location: &Location) -> Result<PopulationLookup> {
        Ok(self.lookup("no population source configured"))
    }
}

/// Derives the surface from the requested terrain.
pub struct HeuristicGeology;

impl HeuristicGeology {
    pub fn profile(terrain: TerrainKind, reason: &str) -> GeologyProfile {
        let ocean = match terrain {
            TerrainKind::Water => OceanContext {
                depth_meters: Some(MEAN_OCEAN_DEPTH_M),
                ..OceanContext::default()
            },
            _ => OceanContext::default(),
        };
        GeologyProfile {
            label: terrain.profile().label.to_string(),
            elevation_meters: match terrain {
                TerrainKind::Water => Some(-MEAN_OCEAN_DEPTH_M),
                _ => None,
            },
            surface_type: terrain.key().to_string(),
            landcover: None,
            water_body: (terrain == TerrainKind::Water).then(|| "Open ocean".to_string()),
            ocean,
            fallback_reason: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl GeologyResolver for HeuristicGeology {
    async fn resolve(&self, _location: &Location, terrain: TerrainKind) -> Result<GeologyProfile> {
        Ok(Self::profile(terrain, "no geology source configured"))
    }
}

// =============================================================================
// SIMULATION REQUEST
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub location: Option<LocationInput>,
    pub diameter: Option<f64>,
    pub velocity: Option<f64>,
    pub angle: Option<f64>,
    pub density: Option<f64>,
    pub terrain: Option<TerrainKind>,
    pub population_override: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub location: Location,
    pub params: ImpactParameters,
    pub population_override: Option<f64>,
}

fn finite(value: Option<f64>, field: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(ImpactLabError::InvalidInput(format!(
            "{} must be a finite number",
            field
        ))),
        None => Err(ImpactLabError::InvalidInput(format!("{} is required", field))),
    }
}

impl SimulationRequest {
    /// Reject missing or non-finite fields, then clamp into physical ranges.
    pub fn validate(self) -> Result<ValidatedRequest> {
        let location = self
            .location
            .ok_or_else(|| ImpactLabError::InvalidInput("location is required".to_string()))?;
        let lat = finite(location.lat, "location.lat")?;
        let lng = finite(location.lng, "location.lng")?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ImpactLabError::InvalidInput(
                "location is outside valid coordinates".to_string(),
            ));
        }

        let params = ImpactParameters {
            diameter: finite(self.diameter, "diameter")?,
            velocity: finite(self.velocity, "velocity")?,
            angle: finite(self.angle, "angle")?,
            density: finite(self.density, "density")?,
            terrain: self.terrain.unwrap_or_default(),
        }
        .clamped();

        Ok(ValidatedRequest {
            location: Location {
                lat,
                lng,
                description: location
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
            },
            params,
            population_override: self
                .population_override
                .filter(|p| p.is_finite() && *p > 0.0),
        })
    }
}

// =============================================================================
// SIMULATION RESULT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub summary: String,
    pub location: Location,
    pub parameters: ImpactParameters,
    pub population: PopulationLookup,
    pub geology: GeologyProfile,
    pub impact: ImpactResult,
    pub infrastructure: InfrastructureEstimate,
    pub casualties: CasualtyEstimate,
    pub tsunami: Option<TsunamiResult>,
    pub footprints: Vec<Footprint>,
}

fn place_name(location: &Location, geology: &GeologyProfile) -> String {
    location.description.clone().unwrap_or_else(|| {
        format!(
            "{:.3}°{}, {:.3}°{} ({})",
            location.lat.abs(),
            if location.lat >= 0.0 { "N" } else { "S" },
            location.lng.abs(),
            if location.lng >= 0.0 { "E" } else { "W" },
            geology.label
        )
    })
}

/// Run the full impact pipeline on resolved inputs. Pure and total.
pub fn simulate(
    request: &ValidatedRequest,
    population: PopulationLookup,
    geology: GeologyProfile,
    tsunami_options: &TsunamiOptions,
) -> SimulationResult {
    let params = &request.params;
    let impact = compute_impact(params);

    let context = &population.context;
    let casualties = estimate_casualties(&impact, context, request.population_override);
    let infrastructure = estimate_infrastructure(&casualties, context, &impact);

    let tsunami = compute_tsunami_impact(
        &TsunamiInput {
            impact: &impact,
            ocean: &geology.ocean,
            population: context,
            explicit_population: explicit_population(context, request.population_override),
        },
        tsunami_options,
    );

    let footprints = build_footprints(&impact, &casualties, &infrastructure, tsunami.as_ref());

    let place = place_name(&request.location, &geology);
    let summary = compose_summary(&SummaryContext {
        place: &place,
        params,
        impact: &impact,
        casualties: &casualties,
        infrastructure: &infrastructure,
        tsunami: tsunami.as_ref(),
    });

    tracing::debug!(
        energy_mt = impact.energy_mt,
        crater_m = impact.final_crater_diameter,
        tsunami = tsunami.is_some(),
        "simulation complete"
    );

    SimulationResult {
        summary,
        location: request.location.clone(),
        parameters: *params,
        population,
        geology,
        impact,
        infrastructure,
        casualties,
        tsunami,
        footprints,
    }
}

// =============================================================================
// CATALOG RESPONSES
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub search: Option<String>,
    #[serde(default)]
    pub hazardous: bool,
}

impl CatalogQuery {
    fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    fn filters(&self) -> CatalogFilters {
        CatalogFilters {
            search: self
                .search
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            hazardous_only: self.hazardous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub asteroids: Vec<AsteroidRecord>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_more: bool,
    pub summary: String,
    pub source: RecordSource,
    pub filters: CatalogFilters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedQuery {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproachFeed {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub asteroids: Vec<AsteroidRecord>,
    pub source: RecordSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitSnapshot {
    pub julian_date: f64,
    pub anomaly: AnomalyState,
    pub position: OrbitalPosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitResponse {
    pub orbit: OrbitalElements,
    pub object: AsteroidRecord,
    pub position: OrbitSnapshot,
    pub path: Vec<OrbitalPosition>,
}

pub fn orbit_snapshot(elements: &OrbitalElements, julian_date: f64) -> OrbitSnapshot {
    let anomaly = propagate_true_anomaly(elements, julian_date);
    OrbitSnapshot {
        julian_date,
        anomaly,
        position: orbital_position_from_true_anomaly(elements, anomaly.true_anomaly),
    }
}

fn paginate_fallback(records: Vec<AsteroidRecord>, query: &CatalogQuery) -> CatalogResponse {
    let page_size = query.page_size();
    let total_items = records.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = query.page().min(total_pages);

    let asteroids: Vec<AsteroidRecord> = records
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    CatalogResponse {
        summary: format!(
            "Showing {} of {} objects from the offline catalog.",
            asteroids.len(),
            total_items
        ),
        asteroids,
        page,
        page_size,
        total_pages,
        total_items,
        has_more: page < total_pages,
        source: RecordSource::Fallback,
        filters: query.filters(),
    }
}

/// NeoWs browse has no server-side search, so filters narrow the fetched page
/// only. With filters active the item count covers this page's matches while
/// paging still walks the full NASA catalog.
pub fn nasa_catalog_response(
    page: &BrowsePage,
    page_size: usize,
    filters: CatalogFilters,
    aliases: &AliasLookup,
) -> CatalogResponse {
    let asteroids: Vec<AsteroidRecord> = page
        .objects
        .iter()
        .map(|neo| build_asteroid_record(neo, aliases))
        .filter(|record| filters.matches(record))
        .collect();

    let total_pages = page.total_pages.max(1) as usize;
    let current = (page.page + 1).max(1) as usize;
    let filtered = filters.search.is_some() || filters.hazardous_only;

    let (total_items, summary) = if filtered {
        (
            asteroids.len(),
            format!(
                "Found {} matching objects on NASA NeoWs page {} of {}; \
                 filters apply to this page only.",
                asteroids.len(),
                current,
                total_pages
            ),
        )
    } else {
        (
            page.total_elements.max(0) as usize,
            format!(
                "Showing {} of {} near-Earth objects from NASA NeoWs.",
                asteroids.len(),
                page.total_elements
            ),
        )
    };

    CatalogResponse {
        summary,
        asteroids,
        page: current,
        page_size,
        total_pages,
        total_items,
        has_more: current < total_pages,
        source: RecordSource::Nasa,
        filters,
    }
}

// =============================================================================
// GLOBAL STATE
// =============================================================================

pub struct AppState {
    pub config: Config,
    pub aliases: AliasLookup,
    pub fallback: FallbackCatalog,
    pub neows: Option<NeoWsClient>,
    pub cache: CatalogCache,
    pub population: Arc<dyn PopulationResolver>,
    pub geology: Arc<dyn GeologyResolver>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let fallback = FallbackCatalog::embedded()?;
        let aliases = fallback.aliases();

        let neows = match &config.nasa_api_key {
            Some(key) => Some(NeoWsClient::new(
                key.clone(),
                config.neows_base_url.clone(),
                config.lookup_timeout,
            )?),
            None => {
                tracing::info!("NASA_API_KEY not set; serving the offline catalog only");
                None
            }
        };

        Ok(Self {
            cache: CatalogCache::new(config.catalog_cache_ttl),
            population: Arc::new(HeuristicPopulation {
                density: config.default_population_density,
            }),
            geology: Arc::new(HeuristicGeology),
            config,
            aliases,
            fallback,
            neows,
        })
    }

    pub fn with_resolvers(
        mut self,
        population: Arc<dyn PopulationResolver>,
        geology: Arc<dyn GeologyResolver>,
    ) -> Self {
        self.population = population;
        self.geology = geology;
        self
    }

    fn fallback_population(&self, reason: &str) -> PopulationLookup {
        HeuristicPopulation {
            density: self.config.default_population_density,
        }
        .lookup(reason)
    }

    async fn resolve_population(&self, location: &Location) -> PopulationLookup {
        let lookup = self.population.resolve(location);
        match tokio::time::timeout(self.config.lookup_timeout, lookup).await {
            Ok(Ok(mut lookup)) => {
                let c = lookup.context;
                lookup.context = PopulationContext::sanitized(c.total, c.density, c.radius_km, 1.0);
                lookup
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "population lookup failed; using heuristic");
                self.fallback_population(&format!("population lookup failed: {}", e))
            }
            Err(_) => {
                tracing::warn!("population lookup timed out; using heuristic");
                self.fallback_population("population lookup timed out")
            }
        }
    }

    async fn resolve_geology(&self, location: &Location, terrain: TerrainKind) -> GeologyProfile {
        match tokio::time::timeout(
            self.config.lookup_timeout,
            self.geology.resolve(location, terrain),
        )
        .await
        {
            Ok(Ok(profile)) => profile,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "geology lookup failed; using heuristic");
                HeuristicGeology::profile(terrain, &format!("geology lookup failed: {}", e))
            }
            Err(_) => {
                tracing::warn!("geology lookup timed out; using heuristic");
                HeuristicGeology::profile(terrain, "geology lookup timed out")
            }
        }
    }

    /// Validate, resolve collaborators concurrently and run the pipeline.
    pub async fn run_simulation(&self, request: SimulationRequest) -> Result<SimulationResult> {
        let request = request.validate()?;

        let (population, geology) = tokio::join!(
            self.resolve_population(&request.location),
            self.resolve_geology(&request.location, request.params.terrain),
        );

        Ok(simulate(&request, population, geology, &self.config.tsunami))
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    async fn nasa_page(
        &self,
        client: &NeoWsClient,
        query: &CatalogQuery,
    ) -> Result<CatalogResponse> {
        let page_size = query.page_size();
        let nasa_page = (query.page() - 1) as i64;

        let page = match self.cache.page(nasa_page, page_size as i64) {
            Some(page) => page,
            None => {
                let page = client.browse(nasa_page, page_size as i64).await?;
                self.cache.store_page(page_size as i64, page.clone());
                page
            }
        };

        tracing::debug!(cached_pages = self.cache.page_count(), "catalog page ready");
        Ok(nasa_catalog_response(&page, page_size, query.filters(), &self.aliases))
    }

    pub async fn list_asteroids(&self, query: CatalogQuery) -> CatalogResponse {
        if let Some(client) = &self.neows {
            match self.nasa_page(client, &query).await {
                Ok(response) => return response,
                Err(e) => {
                    tracing::warn!(error = %e, "NASA catalog unavailable; using offline catalog")
                }
            }
        }
        paginate_fallback(self.fallback.filtered(&query.filters()), &query)
    }

    /// Objects making a close approach between `start` and `end` inclusive.
    pub async fn approaches(&self, query: FeedQuery) -> Result<ApproachFeed> {
        let start = query.start;
        let end = query.end.unwrap_or(start);
        if end < start || (end - start).num_days() > MAX_FEED_DAYS {
            return Err(ImpactLabError::InvalidInput(format!(
                "approach window must span 0-{} days",
                MAX_FEED_DAYS
            )));
        }

        if let Some(client) = &self.neows {
            match client.fetch_feed(start, end).await {
                Ok(neos) => {
                    for neo in &neos {
                        self.cache.store_object(neo.clone());
                    }
                    tracing::debug!(cached = self.cache.object_count(), "feed cached");
                    return Ok(ApproachFeed {
                        start,
                        end,
                        asteroids: neos
                            .iter()
                            .map(|neo| build_asteroid_record(neo, &self.aliases))
                            .collect(),
                        source: RecordSource::Nasa,
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "NASA feed unavailable; using offline catalog")
                }
            }
        }

        let asteroids = self
            .fallback
            .records()
            .iter()
            .filter(|record| {
                record
                    .approach_date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                    .is_some_and(|d| d >= start && d <= end)
            })
            .cloned()
            .collect();
        Ok(ApproachFeed {
            start,
            end,
            asteroids,
            source: RecordSource::Fallback,
        })
    }

    pub async fn get_asteroid(&self, id: &str) -> Result<AsteroidRecord> {
        if let Some((_, record)) = self.fallback.find(id) {
            return Ok(record.clone());
        }
        let neo = self.fetch_neo(id).await?;
        Ok(build_asteroid_record(&neo, &self.aliases))
    }

    async fn fetch_neo(&self, id: &str) -> Result<crate::api_client::NeoObject> {
        if !is_neo_id(id) {
            return Err(ImpactLabError::InvalidInput(format!(
                "{:?} is not a known asteroid id",
                id
            )));
        }
        if let Some(neo) = self.cache.object(id) {
            return Ok(neo);
        }
        let client = self
            .neows
            .as_ref()
            .ok_or_else(|| ImpactLabError::NotFound(format!("asteroid {}", id)))?;
        let neo = client.fetch_neo(id).await?;
        self.cache.store_object(neo.clone());
        Ok(neo)
    }

    pub async fn get_orbit(&self, id: &str, at_julian: Option<f64>) -> Result<OrbitResponse> {
        let jd = at_julian
            .filter(|jd| jd.is_finite())
            .unwrap_or_else(|| julian_date(chrono::Utc::now()));

        let (orbit, object) = match self.fallback.find(id) {
            Some((preset, record)) => {
                let orbit = preset.orbit.clone().ok_or_else(|| {
                    ImpactLabError::NotFound(format!("orbit for {}", record.name))
                })?;
                (orbit, record.clone())
            }
            None => {
                let neo = self.fetch_neo(id).await?;
                let data = neo.orbital_data.as_ref().ok_or_else(|| {
                    ImpactLabError::MalformedUpstream(format!("{} has no orbital data", neo.id))
                })?;
                (parse_orbital_elements(data)?, build_asteroid_record(&neo, &self.aliases))
            }
        };

        Ok(OrbitResponse {
            position: orbit_snapshot(&orbit, jd),
            path: sample_orbit_path(&orbit, ORBIT_PATH_POINTS),
            orbit,
            object,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint_builder::FootprintKind;
    use std::time::Duration;

    fn request(terrain: TerrainKind) -> SimulationRequest {
        SimulationRequest {
            location: Some(LocationInput {
                lat: Some(35.0),
                lng: Some(-40.0),
                description: None,
            }),
            diameter: Some(1000.0),
            velocity: Some(20.0),
            angle: Some(45.0),
            density: Some(3300.0),
            terrain: Some(terrain),
            population_override: None,
        }
    }

    fn state() -> AppState {
        AppState::new(Config::default()).unwrap()
    }

    struct FailingPopulation;

    #[async_trait]
    impl PopulationResolver for FailingPopulation {
        async fn resolve(&self, _location: &Location) -> Result<PopulationLookup> {
            Err(ImpactLabError::Upstream {
                status: 503,
                message: None,
            })
        }
    }

    struct SlowGeology;

    #[async_trait]
    impl GeologyResolver for SlowGeology {
        async fn resolve(
            &self,
            _location: &Location,
            terrain: TerrainKind,
        ) -> Result<GeologyProfile> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(HeuristicGeology::profile(terrain, "never returned"))
        }
    }

    #[test]
    fn test_validation_rejects_missing_and_non_finite() {
        let mut missing_location = request(TerrainKind::Land);
        missing_location.location = None;
        assert!(matches!(
            missing_location.validate(),
            Err(ImpactLabError::InvalidInput(_))
        ));

        let mut nan_velocity = request(TerrainKind::Land);
        nan_velocity.velocity = Some(f64::NAN);
        let err = nan_velocity.validate().unwrap_err();
        assert!(err.to_string().contains("velocity"));

        let mut bad_lat = request(TerrainKind::Land);
        bad_lat.location.as_mut().unwrap().lat = Some(123.0);
        assert!(bad_lat.validate().is_err());
    }

    #[test]
    fn test_validation_clamps_and_filters_override() {
        let mut req = request(TerrainKind::Land);
        req.diameter = Some(1.0);
        req.angle = Some(0.0);
        req.population_override = Some(-5.0);
        let validated = req.validate().unwrap();
        assert_eq!(validated.params.diameter, 5.0);
        assert_eq!(validated.params.angle, 5.0);
        assert_eq!(validated.population_override, None);
    }

    #[test]
    fn test_request_json_shape() {
        let req: SimulationRequest = serde_json::from_str(
            r#"{"location":{"lat":48.85,"lng":2.35,"description":"Paris"},
                "diameter":150,"velocity":18,"angle":60,"density":3000,
                "terrain":"lava","populationOverride":2000000}"#,
        )
        .unwrap();
        let validated = req.validate().unwrap();
        assert_eq!(validated.params.terrain, TerrainKind::Land);
        assert_eq!(validated.population_override, Some(2_000_000.0));
        assert_eq!(validated.location.description.as_deref(), Some("Paris"));
    }

    #[test]
    fn test_simulate_land_has_no_tsunami() {
        let validated = request(TerrainKind::Land).validate().unwrap();
        let population = HeuristicPopulation { density: 40.0 }.lookup("test");
        let geology = HeuristicGeology::profile(TerrainKind::Land, "test");
        let result = simulate(&validated, population, geology, &TsunamiOptions::default());

        assert!(result.tsunami.is_none());
        assert_eq!(result.footprints.len(), 5);
        assert!(result.summary.contains("35.000°N, 40.000°W"));
        assert!(result.infrastructure.economic_loss > 0.0);
    }

    #[test]
    fn test_simulate_ocean_adds_tsunami() {
        let validated = request(TerrainKind::Water).validate().unwrap();
        let population = HeuristicPopulation { density: 40.0 }.lookup("test");
        let geology = HeuristicGeology::profile(TerrainKind::Water, "test");
        let result = simulate(&validated, population, geology, &TsunamiOptions::default());

        let tsunami = result.tsunami.expect("deep ocean impact should raise a tsunami");
        assert!(tsunami.inundation_distance_km > 0.0);
        assert_eq!(result.footprints.last().unwrap().kind, FootprintKind::Tsunami);
    }

    #[tokio::test]
    async fn test_run_simulation_with_default_resolvers() {
        let result = state().run_simulation(request(TerrainKind::Water)).await.unwrap();
        assert_eq!(result.population.source, "heuristic");
        assert!(result.geology.fallback_reason.is_some());
        assert!(result.tsunami.is_some());
    }

    #[tokio::test]
    async fn test_collaborator_failures_fall_back() {
        let mut config = Config::default();
        config.lookup_timeout = Duration::from_millis(50);
        let state = AppState::new(config)
            .unwrap()
            .with_resolvers(Arc::new(FailingPopulation), Arc::new(SlowGeology));

        let result = state.run_simulation(request(TerrainKind::Land)).await.unwrap();
        assert_eq!(result.population.source, "heuristic");
        assert!(result.population.meta["reason"]
            .as_str()
            .unwrap()
            .contains("failed"));
        assert_eq!(
            result.geology.fallback_reason.as_deref(),
            Some("geology lookup timed out")
        );
    }

    #[tokio::test]
    async fn test_invalid_request_computes_nothing() {
        let mut req = request(TerrainKind::Land);
        req.diameter = None;
        let err = state().run_simulation(req).await.unwrap_err();
        assert!(matches!(err, ImpactLabError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_offline_catalog_pagination() {
        let state = state();
        let response = state
            .list_asteroids(CatalogQuery {
                page: Some(2),
                page_size: Some(4),
                ..CatalogQuery::default()
            })
            .await;
        assert_eq!(response.source, RecordSource::Fallback);
        assert_eq!(response.page, 2);
        assert_eq!(response.asteroids.len(), 4);
        assert_eq!(response.total_items, 10);
        assert_eq!(response.total_pages, 3);
        assert!(response.has_more);

        let past_end = state
            .list_asteroids(CatalogQuery {
                page: Some(99),
                page_size: Some(4),
                ..CatalogQuery::default()
            })
            .await;
        assert_eq!(past_end.page, 3);
        assert!(!past_end.has_more);
    }

    #[tokio::test]
    async fn test_offline_catalog_filters() {
        let response = state()
            .list_asteroids(CatalogQuery {
                search: Some("  bennu ".to_string()),
                ..CatalogQuery::default()
            })
            .await;
        assert_eq!(response.total_items, 1);
        assert_eq!(response.asteroids[0].name, "Bennu");
        assert_eq!(response.filters.search.as_deref(), Some("bennu"));
    }

    #[tokio::test]
    async fn test_orbit_lookup_from_presets() {
        let state = state();
        let response = state.get_orbit("2099942", Some(2_460_600.5)).await.unwrap();
        assert_eq!(response.object.name, "Apophis");
        assert_eq!(response.path.len(), ORBIT_PATH_POINTS);
        assert!(response.position.anomaly.radius_au > response.orbit.perihelion_au() - 1e-9);
        assert!(response.position.anomaly.radius_au < response.orbit.aphelion_au() + 1e-9);

        // Historic airbursts carry no orbit
        let err = state.get_orbit("fallback-tunguska", None).await.unwrap_err();
        assert!(matches!(err, ImpactLabError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_offline_approach_feed() {
        let state = state();
        let date = NaiveDate::from_ymd_opt(2029, 4, 13).unwrap();
        let feed = state
            .approaches(FeedQuery {
                start: date,
                end: None,
            })
            .await
            .unwrap();
        assert_eq!(feed.source, RecordSource::Fallback);
        assert!(feed.asteroids.iter().any(|a| a.name == "Apophis"));

        let too_wide = state
            .approaches(FeedQuery {
                start: date,
                end: Some(date + chrono::Duration::days(8)),
            })
            .await;
        assert!(matches!(too_wide, Err(ImpactLabError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unknown_asteroid_without_api_key() {
        let err = state().get_asteroid("3542519").await.unwrap_err();
        assert!(matches!(err, ImpactLabError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_like_ids_never_reach_neows() {
        let mut config = Config::default();
        config.nasa_api_key = Some("SECRET".to_string());
        config.neows_base_url = "http://127.0.0.1:9/neo/rest/v1".to_string();
        let state = AppState::new(config).unwrap();

        for id in ["../../../planetary/apod", "2099942/../../x", "a b"] {
            let err = state.get_asteroid(id).await.unwrap_err();
            assert!(matches!(err, ImpactLabError::InvalidInput(_)), "{id}");
            let err = state.get_orbit(id, None).await.unwrap_err();
            assert!(matches!(err, ImpactLabError::InvalidInput(_)), "{id}");
        }
    }

    fn nasa_page_fixture() -> BrowsePage {
        let objects = [
            ("2099942", "99942 Apophis (2004 MN4)", true),
            ("3542519", "(2010 PK9)", false),
            ("2433", "433 Eros (A898 PA)", false),
        ]
        .into_iter()
        .map(|(id, name, hazardous)| {
            crate::api_client::parse_neo_object(json!({
                "id": id,
                "name": name,
                "absolute_magnitude_h": 20.0,
                "is_potentially_hazardous_asteroid": hazardous
            }))
            .unwrap()
        })
        .collect();
        BrowsePage {
            objects,
            page: 4,
            total_pages: 2050,
            total_elements: 41000,
        }
    }

    #[test]
    fn test_nasa_page_without_filters_reports_catalog_totals() {
        let response = nasa_catalog_response(
            &nasa_page_fixture(),
            20,
            CatalogFilters::default(),
            &AliasLookup::default(),
        );
        assert_eq!(response.source, RecordSource::Nasa);
        assert_eq!(response.page, 5);
        assert_eq!(response.asteroids.len(), 3);
        assert_eq!(response.total_items, 41000);
        assert_eq!(response.total_pages, 2050);
        assert!(response.has_more);
    }

    #[test]
    fn test_nasa_page_filters_count_page_matches() {
        let no_match = nasa_catalog_response(
            &nasa_page_fixture(),
            20,
            CatalogFilters {
                search: Some("bennu".to_string()),
                hazardous_only: false,
            },
            &AliasLookup::default(),
        );
        assert!(no_match.asteroids.is_empty());
        assert_eq!(no_match.total_items, 0);
        assert!(no_match.summary.contains("this page only"));
        assert!(no_match.has_more);

        let hazardous = nasa_catalog_response(
            &nasa_page_fixture(),
            20,
            CatalogFilters {
                search: None,
                hazardous_only: true,
            },
            &AliasLookup::default(),
        );
        assert_eq!(hazardous.total_items, 1);
        assert_eq!(hazardous.asteroids[0].id, "2099942");
    }
}
