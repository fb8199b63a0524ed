// NASA NeoWs API Client
// Typed raw shapes, parse-and-validate boundary and a TTL page cache

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::{ImpactLabError, Result};
use crate::orbit_mechanics::{OrbitalElements, J2000_JULIAN};

// =============================================================================
// API RESPONSE TYPES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub element_count: Option<i64>,
    #[serde(default)]
    pub near_earth_objects: HashMap<String, Vec<NeoObject>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeoObject {
    pub id: String,
    pub name: String,
    pub neo_reference_id: Option<String>,
    pub name_limited: Option<String>,
    pub designation: Option<String>,
    pub absolute_magnitude_h: Option<f64>,
    pub estimated_diameter: Option<EstimatedDiameter>,
    pub is_potentially_hazardous_asteroid: Option<bool>,
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproachData>,
    pub orbital_data: Option<OrbitalData>,
    pub is_sentry_object: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    pub kilometers: Option<DiameterRange>,
    pub meters: Option<DiameterRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiameterRange {
    pub estimated_diameter_min: f64,
    pub estimated_diameter_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseApproachData {
    pub close_approach_date: Option<String>,
    pub relative_velocity: Option<RelativeVelocity>,
    pub miss_distance: Option<MissDistance>,
    pub orbiting_body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeVelocity {
    pub kilometers_per_second: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissDistance {
    pub astronomical: Option<String>,
    pub kilometers: Option<String>,
}

// NeoWs encodes orbital numbers as strings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitalData {
    pub orbit_id: Option<String>,
    pub minimum_orbit_intersection: Option<String>,
    pub epoch_osculation: Option<String>,
    pub eccentricity: Option<String>,
    pub semi_major_axis: Option<String>,
    pub inclination: Option<String>,
    pub ascending_node_longitude: Option<String>,
    pub orbital_period: Option<String>,
    pub perihelion_argument: Option<String>,
    pub mean_anomaly: Option<String>,
    pub mean_motion: Option<String>,
    pub orbit_class: Option<OrbitClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrbitClass {
    pub orbit_class_type: Option<String>,
    pub orbit_class_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseResponse {
    pub page: Option<PageInfo>,
    pub near_earth_objects: Vec<NeoObject>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageInfo {
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number: i64,
}

// =============================================================================
// PARSE AND VALIDATE
// =============================================================================

pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

impl NeoObject {
    pub fn validated(self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(ImpactLabError::MalformedUpstream(
                "near-earth object without id".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ImpactLabError::MalformedUpstream(format!(
                "near-earth object {} without name",
                self.id
            )));
        }
        Ok(self)
    }

    pub fn orbit_class_type(&self) -> Option<&str> {
        self.orbital_data
            .as_ref()
            .and_then(|o| o.orbit_class.as_ref())
            .and_then(|c| c.orbit_class_type.as_deref())
    }
}

pub fn parse_neo_object(value: serde_json::Value) -> Result<NeoObject> {
    serde_json::from_value::<NeoObject>(value)
        .map_err(|e| ImpactLabError::MalformedUpstream(format!("neo object: {}", e)))?
        .validated()
}

pub fn parse_browse_response(value: serde_json::Value) -> Result<BrowseResponse> {
    let mut response = serde_json::from_value::<BrowseResponse>(value)
        .map_err(|e| ImpactLabError::MalformedUpstream(format!("browse response: {}", e)))?;
    response.near_earth_objects = response
        .near_earth_objects
        .into_iter()
        .map(NeoObject::validated)
        .collect::<Result<Vec<_>>>()?;
    Ok(response)
}

pub fn parse_feed_response(value: serde_json::Value) -> Result<Vec<NeoObject>> {
    let response = serde_json::from_value::<FeedResponse>(value)
        .map_err(|e| ImpactLabError::MalformedUpstream(format!("feed response: {}", e)))?;

    let mut dates: Vec<_> = response.near_earth_objects.into_iter().collect();
    dates.sort_by(|a, b| a.0.cmp(&b.0));
    dates
        .into_iter()
        .flat_map(|(_date, neos)| neos)
        .map(NeoObject::validated)
        .collect()
}

/// Convert NeoWs orbital data into elements. Every angular element and the
/// semi-major axis are required.
pub fn parse_orbital_elements(data: &OrbitalData) -> Result<OrbitalElements> {
    let required = |field: &Option<String>, name: &str| {
        parse_number(field.as_deref()).ok_or_else(|| {
            ImpactLabError::MalformedUpstream(format!("orbital data missing {}", name))
        })
    };

    let semi_major_axis_au = required(&data.semi_major_axis, "semi_major_axis")?;
    if semi_major_axis_au <= 0.0 {
        return Err(ImpactLabError::MalformedUpstream(format!(
            "non-elliptical orbit (a = {})",
            semi_major_axis_au
        )));
    }

    Ok(OrbitalElements {
        semi_major_axis_au,
        eccentricity: required(&data.eccentricity, "eccentricity")?,
        inclination_deg: required(&data.inclination, "inclination")?,
        ascending_node_deg: required(&data.ascending_node_longitude, "ascending_node_longitude")?,
        arg_perihelion_deg: required(&data.perihelion_argument, "perihelion_argument")?,
        mean_anomaly_deg: required(&data.mean_anomaly, "mean_anomaly")?,
        epoch_julian: parse_number(data.epoch_osculation.as_deref()).unwrap_or(J2000_JULIAN),
        period_days: parse_number(data.orbital_period.as_deref()),
        mean_motion_deg_per_day: parse_number(data.mean_motion.as_deref()),
    })
}

// =============================================================================
// API CLIENT
// =============================================================================

/// Longest id accepted before a lookup is forwarded upstream
const MAX_NEO_ID_LEN: usize = 32;

/// NeoWs ids are SPK-style ASCII alphanumerics. Anything else would escape
/// the `/neo/{id}` path segment.
pub fn is_neo_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_NEO_ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct BrowsePage {
    pub objects: Vec<NeoObject>,
    pub page: i64,
    pub total_pages: i64,
    pub total_elements: i64,
}

pub struct NeoWsClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl NeoWsClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            base_url,
            client,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ImpactLabError::NotFound(format!("neows resource {}", path)));
        }
        if !status.is_success() {
            let message = response.text().await.ok().filter(|m| !m.is_empty());
            return Err(ImpactLabError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ImpactLabError::MalformedUpstream(e.to_string()))
    }

    /// Browse all NEOs with pagination (NeoWs pages are zero-based)
    pub async fn browse(&self, page: i64, size: i64) -> Result<BrowsePage> {
        let value = self
            .get_json(
                "/neo/browse",
                &[("page", page.to_string()), ("size", size.to_string())],
            )
            .await?;
        let data = parse_browse_response(value)?;
        let info = data.page.unwrap_or(PageInfo {
            size,
            total_elements: data.near_earth_objects.len() as i64,
            total_pages: 1,
            number: page,
        });

        Ok(BrowsePage {
            objects: data.near_earth_objects,
            page: info.number,
            total_pages: info.total_pages,
            total_elements: info.total_elements,
        })
    }

    /// Fetch a specific NEO by ID
    pub async fn fetch_neo(&self, neo_id: &str) -> Result<NeoObject> {
        if !is_neo_id(neo_id) {
            return Err(ImpactLabError::InvalidInput(format!(
                "{:?} is not a NeoWs object id",
                neo_id
            )));
        }
        let value = self.get_json(&format!("/neo/{}", neo_id), &[]).await?;
        parse_neo_object(value)
    }

    /// Fetch NEOs that approach Earth in a date range (NeoWs allows 7 days)
    pub async fn fetch_feed(
        &self,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    ) -> Result<Vec<NeoObject>> {
        if end < start || (end - start).num_days() > 7 {
            return Err(ImpactLabError::InvalidInput(
                "feed range must be 0-7 days".to_string(),
            ));
        }
        let value = self
            .get_json(
                "/feed",
                &[
                    ("start_date", start.format("%Y-%m-%d").to_string()),
                    ("end_date", end.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        parse_feed_response(value)
    }
}

// =============================================================================
// CACHE MANAGER
// =============================================================================

pub struct CatalogCache {
    pages: RwLock<HashMap<(i64, i64), (Instant, BrowsePage)>>,
    objects: RwLock<HashMap<String, (Instant, NeoObject)>>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            objects: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn page(&self, page: i64, size: i64) -> Option<BrowsePage> {
        self.pages
            .read()
            .get(&(page, size))
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, p)| p.clone())
    }

    /// Stores a page and its objects; expired entries are evicted first.
    pub fn store_page(&self, size: i64, page: BrowsePage) {
        let now = Instant::now();
        {
            let mut objects = self.objects.write();
            objects.retain(|_, (at, _)| at.elapsed() < self.ttl);
            for neo in &page.objects {
                objects.insert(neo.id.clone(), (now, neo.clone()));
            }
        }
        let mut pages = self.pages.write();
        pages.retain(|_, (at, _)| at.elapsed() < self.ttl);
        pages.insert((page.page, size), (now, page));
    }

    pub fn object(&self, id: &str) -> Option<NeoObject> {
        self.objects
            .read()
            .get(id)
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .map(|(_, neo)| neo.clone())
    }

    pub fn store_object(&self, neo: NeoObject) {
        let mut objects = self.objects.write();
        objects.retain(|_, (at, _)| at.elapsed() < self.ttl);
        objects.insert(neo.id.clone(), (Instant::now(), neo));
    }

    /// Objects still within the TTL
    pub fn object_count(&self) -> usize {
        self.objects
            .read()
            .values()
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .count()
    }

    pub fn page_count(&self) -> usize {
        self.pages
            .read()
            .values()
            .filter(|(at, _)| at.elapsed() < self.ttl)
            .count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
