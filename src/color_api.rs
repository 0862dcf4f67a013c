//! Client for a color.pizza compatible naming service.

use crate::error::ColorApiError;
use crate::naming::ColorNameRecord;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Six lowercase hex digits, no `#`.
    pub hex: String,
    pub name: String,
}

pub trait ColorService {
    /// The full list of exactly named colors.
    fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ColorApiError>;

    /// Nearest names for `hexes`, one record per input in the same order.
    fn fetch_nearest(&self, hexes: &[String]) -> Result<Vec<ColorNameRecord>, ColorApiError>;
}

#[derive(Debug, Deserialize)]
struct ColorsResponse {
    colors: Option<Vec<ColorPayload>>,
}

#[derive(Debug, Deserialize)]
struct ColorPayload {
    #[serde(default)]
    hex: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    distance: Option<f64>,
}

pub struct ColorPizzaClient {
    client: reqwest::blocking::Client,
    catalog_url: String,
    nearest_url: String,
}

impl ColorPizzaClient {
    pub fn new(catalog_url: &str, nearest_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            catalog_url: catalog_url.to_string(),
            nearest_url: nearest_url.to_string(),
        }
    }

    fn get(&self, request: reqwest::blocking::RequestBuilder) -> Result<Vec<ColorPayload>, ColorApiError> {
        let response: ColorsResponse = request.send()?.error_for_status()?.json()?;
        response
            .colors
            .ok_or_else(|| ColorApiError::InvalidResponse("missing colors array".to_string()))
    }
}

impl ColorService for ColorPizzaClient {
    fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ColorApiError> {
        let colors = self.get(self.client.get(&self.catalog_url))?;
        Ok(catalog_entries(colors))
    }

    fn fetch_nearest(&self, hexes: &[String]) -> Result<Vec<ColorNameRecord>, ColorApiError> {
        if hexes.is_empty() {
            return Ok(Vec::new());
        }
        let values = hexes.join(",");
        let request = self.client.get(&self.nearest_url).query(&[
            ("values", values.as_str()),
            ("list", "default"),
            ("goodnamesonly", "true"),
            ("noduplicates", "true"),
        ]);
        let colors = self.get(request)?;
        nearest_records(colors, hexes.len())
    }
}

fn catalog_entries(colors: Vec<ColorPayload>) -> Vec<CatalogEntry> {
    colors
        .into_iter()
        .filter_map(|color| {
            let hex = color.hex?.trim_start_matches('#').to_ascii_lowercase();
            let name = color.name?;
            Some(CatalogEntry { hex, name })
        })
        .collect()
}

fn nearest_records(
    colors: Vec<ColorPayload>,
    expected: usize,
) -> Result<Vec<ColorNameRecord>, ColorApiError> {
    if colors.len() != expected {
        return Err(ColorApiError::InvalidResponse(format!(
            "expected {} colors, got {}",
            expected,
            colors.len()
        )));
    }
    colors
        .into_iter()
        .map(|color| {
            let name = color
                .name
                .ok_or_else(|| ColorApiError::InvalidResponse("color without name".to_string()))?;
            Ok(ColorNameRecord {
                name,
                distance: color.distance.unwrap_or(0.0),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ColorsResponse, catalog_entries, nearest_records};

    fn parse(json: &str) -> ColorsResponse {
        serde_json::from_str(json).expect("valid response json")
    }

    #[test]
    fn reads_catalog_entries() {
        let response = parse(
            r##"{"colors":[{"hex":"#FF0000","name":"Red"},{"name":"No Hex"},{"hex":"#00ff00","name":"Lime"}]}"##,
        );
        let entries = catalog_entries(response.colors.expect("colors"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].hex, "ff0000");
        assert_eq!(entries[0].name, "Red");
    }

    #[test]
    fn nearest_requires_one_record_per_hex() {
        let response = parse(r#"{"colors":[{"name":"Crimson Glory","distance":3.5}]}"#);
        let records = nearest_records(response.colors.expect("colors"), 1).expect("records");
        assert_eq!(records[0].name, "Crimson Glory");
        assert_eq!(records[0].distance, 3.5);

        let response = parse(r#"{"colors":[{"name":"Only One","distance":1}]}"#);
        assert!(nearest_records(response.colors.expect("colors"), 2).is_err());
    }

    #[test]
    fn missing_colors_array_is_detected() {
        let response = parse(r#"{"error":"bad"}"#);
        assert!(response.colors.is_none());
    }
}
