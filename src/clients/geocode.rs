use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq)]
pub struct AddressQuery {
    pub street: String,
    pub city: String,
    pub postcode: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` when the service knows no such address.
    async fn locate(&self, address: &AddressQuery) -> AppResult<Option<Coordinates>>;
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn locate(&self, address: &AddressQuery) -> AppResult<Option<Coordinates>> {
        let response: FeatureCollection = self
            .http
            .get(&self.url)
            .query(&[
                ("street", address.street.as_str()),
                ("city", address.city.as_str()),
                ("country", "dk"),
                ("postalcode", address.postcode.as_str()),
                ("format", "geojson"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.first_point())
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl FeatureCollection {
    /// GeoJSON orders coordinates as `[longitude, latitude]`.
    fn first_point(&self) -> Option<Coordinates> {
        match self.features.first()?.geometry.coordinates.as_slice() {
            [longitude, latitude, ..] => Some(Coordinates {
                longitude: *longitude,
                latitude: *latitude,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_feature_point_is_used() {
        let body = serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                { "geometry": { "type": "Point", "coordinates": [10.2039, 56.1629] } },
                { "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } }
            ]
        });
        let collection: FeatureCollection = serde_json::from_value(body).unwrap();

        assert_eq!(
            collection.first_point(),
            Some(Coordinates {
                longitude: 10.2039,
                latitude: 56.1629
            })
        );
    }

    #[test]
    fn no_features_means_unknown_address() {
        let collection: FeatureCollection =
            serde_json::from_value(serde_json::json!({ "type": "FeatureCollection", "features": [] }))
                .unwrap();
        assert_eq!(collection.first_point(), None);
    }
}
