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

mod app;
mod config;
mod map;
mod worker;

use chrono::{Local, NaiveDate};
use clap::Parser;
use eframe::egui;
use geohash_client::HttpBackend;
use log::{error, info, warn};

use app::{GeohashApp, LaunchOptions};
use config::{AppConfig, API_URL_ENV};

/// Daily geohash map viewer
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Graticule latitude (whole degrees)
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<String>,

    /// Graticule longitude (whole degrees)
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<String>,

    /// Geohash API base URL (overrides config and GEOHASH_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Puzzle date as YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.print_config_path {
        match AppConfig::get_config_path() {
            Ok(path) => println!("{}", path.display()),
            Err(e) => error!("Cannot determine config path: {}", e),
        }
        return Ok(());
    }

    let config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let env_url = std::env::var(API_URL_ENV).ok();
    let api_url = config.api_url(args.api_url.as_deref(), env_url.as_deref());
    let backend = match HttpBackend::new(api_url) {
        Ok(backend) => backend,
        Err(e) => {
            error!("Cannot create HTTP client: {}", e);
            std::process::exit(1);
        }
    };
    info!("Using geohash API at {}", backend.base_url());

    let launch = LaunchOptions {
        lat: args.lat,
        lng: args.lng,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Geohash Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Geohash Viewer",
        options,
        Box::new(move |cc| Ok(Box::new(GeohashApp::new(cc, config, backend, launch)?))),
    )
}
