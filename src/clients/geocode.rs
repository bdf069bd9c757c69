//! Nominatim geocoder client.
//!
//! Nominatim returns coordinates as decimal strings; the first entry whose
//! coordinates parse becomes the [`GeocodeHit`].

use serde::Deserialize;

use super::Geocoder;
use super::http::JsonHttp;
use super::types::{ClientError, GeocodeHit};
use crate::config::HttpTimeouts;

pub struct NominatimClient {
    http: JsonHttp,
}

impl NominatimClient {
    /// Nominatim's usage policy requires an identifying `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str, user_agent: &str, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        Ok(Self { http: JsonHttp::new(base_url, timeouts, Some(user_agent))? })
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Option<GeocodeHit>, ClientError> {
        let places: Vec<Place> = self
            .http
            .get_with_query("/search", &[("format", "json"), ("limit", "1"), ("q", query)])
            .await?;
        Ok(first_hit(places))
    }
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

fn first_hit(places: Vec<Place>) -> Option<GeocodeHit> {
    places.into_iter().find_map(|place| {
        let lat = place.lat.trim().parse::<f64>().ok()?;
        let lon = place.lon.trim().parse::<f64>().ok()?;
        Some(GeocodeHit { lat, lon, display_name: place.display_name })
    })
}

#[cfg(test)]
#[path = "geocode_test.rs"]
mod tests;
