// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP/JSON backend for the geohash API.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET /geohash/{lat}/{lng}/{YYYY-MM-DD}` returns
//!   `{"djia": "...", "date": "YYYY-MM-DD", "location": [lat, lng]}`
//! - `GET /geohash/forecast` returns `[{"date", "latFraction", "lonFraction"}]`
//! - `GET /geohash/global` returns `{"location": [lat, lng]}`

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::graticule::{GraticuleCell, LatLng};
use crate::puzzle::{Backend, BackendError, ForecastEntry, GlobalPuzzle, PuzzleResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct PuzzleWire {
    djia: String,
    date: NaiveDate,
    location: (f64, f64),
}

impl From<PuzzleWire> for PuzzleResult {
    fn from(wire: PuzzleWire) -> Self {
        PuzzleResult::from_location(LatLng::from(wire.location), wire.djia, wire.date)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastWire {
    date: NaiveDate,
    lat_fraction: f64,
    lon_fraction: f64,
}

impl From<ForecastWire> for ForecastEntry {
    fn from(wire: ForecastWire) -> Self {
        ForecastEntry {
            date: wire.date,
            lat_fraction: wire.lat_fraction,
            lon_fraction: wire.lon_fraction,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalWire {
    location: (f64, f64),
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl From<GlobalWire> for GlobalPuzzle {
    fn from(wire: GlobalWire) -> Self {
        GlobalPuzzle {
            location: LatLng::from(wire.location),
            date: wire.date,
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

/// [`Backend`] talking to the geohash REST API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend for `base_url` (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn puzzle_url(&self, cell: GraticuleCell, date: NaiveDate) -> String {
        let (lat, lng) = cell.to_route_params();
        format!(
            "{}/geohash/{}/{}/{}",
            self.base_url,
            lat,
            lng,
            date.format("%Y-%m-%d")
        )
    }

    #[must_use]
    pub fn forecast_url(&self) -> String {
        format!("{}/geohash/forecast", self.base_url)
    }

    #[must_use]
    pub fn global_url(&self) -> String {
        format!("{}/geohash/global", self.base_url)
    }

    async fn get_body(&self, url: String) -> Result<String, BackendError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(BackendError::NotFound(url)),
            status if !status.is_success() => {
                return Err(BackendError::Network(format!("HTTP {status} from {url}")));
            }
            _ => {}
        }

        response
            .text()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))
    }
}

impl Backend for HttpBackend {
    fn get_puzzle(
        &self,
        cell: GraticuleCell,
        date: NaiveDate,
    ) -> impl Future<Output = Result<PuzzleResult, BackendError>> + Send {
        let url = self.puzzle_url(cell, date);
        async move {
            let body = self.get_body(url).await?;
            decode::<PuzzleWire>(&body).map(PuzzleResult::from)
        }
    }

    fn get_forecast(&self) -> impl Future<Output = Result<Vec<ForecastEntry>, BackendError>> + Send {
        let url = self.forecast_url();
        async move {
            let body = self.get_body(url).await?;
            let entries = decode::<Vec<ForecastWire>>(&body)?;
            Ok(entries.into_iter().map(ForecastEntry::from).collect())
        }
    }

    fn get_global_puzzle(&self) -> impl Future<Output = Result<GlobalPuzzle, BackendError>> + Send {
        let url = self.global_url();
        async move {
            let body = self.get_body(url).await?;
            decode::<GlobalWire>(&body).map(GlobalPuzzle::from)
        }
    }
}
