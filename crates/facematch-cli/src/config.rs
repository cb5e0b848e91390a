use anyhow::{Context, Result};
use facematch_core::output::DEFAULT_RESULTS_DIR;
use facematch_core::search::DEFAULT_PORTRAITS_DIR;
use facematch_core::service::{
    DEFAULT_INDEX_MAX_FACES, DEFAULT_MATCH_THRESHOLD, DEFAULT_SEARCH_MAX_FACES,
};
use facematch_core::{FixedDelay, IndexOptions, SearchOptions};
use facematch_rekognition::RekognitionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration: defaults, then an optional TOML file, then
/// `FACEMATCH_*` environment variables. Command-line flags apply last.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// AWS region; unset defers to the standard AWS lookup chain.
    pub region: Option<String>,
    /// Named AWS profile; unset defers to `AWS_PROFILE` or `default`.
    pub profile: Option<String>,
    /// Rekognition endpoint override (e.g. a local emulator).
    pub endpoint: Option<String>,
    /// Portraits looked up by the file name they were indexed under.
    pub portraits_dir: PathBuf,
    /// Where composite result images are written.
    pub results_dir: PathBuf,
    /// Pause after each remote call, in milliseconds.
    pub throttle_ms: u64,
    /// Minimum similarity (percent) for a search match.
    pub match_threshold: f32,
    pub index_max_faces: u32,
    pub search_max_faces: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            endpoint: None,
            portraits_dir: PathBuf::from(DEFAULT_PORTRAITS_DIR),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            throttle_ms: 100,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            index_max_faces: DEFAULT_INDEX_MAX_FACES,
            search_max_faces: DEFAULT_SEARCH_MAX_FACES,
        }
    }
}

impl Config {
    /// Load from `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply `FACEMATCH_*` overrides read through `var`. Unparseable values
    /// are ignored.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(region) = var("FACEMATCH_REGION") {
            self.region = Some(region);
        }
        if let Some(profile) = var("FACEMATCH_PROFILE") {
            self.profile = Some(profile);
        }
        if let Some(endpoint) = var("FACEMATCH_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(dir) = var("FACEMATCH_PORTRAITS_DIR") {
            self.portraits_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("FACEMATCH_RESULTS_DIR") {
            self.results_dir = PathBuf::from(dir);
        }
        self.throttle_ms = parse_or(var("FACEMATCH_THROTTLE_MS"), self.throttle_ms);
        self.match_threshold = parse_or(var("FACEMATCH_MATCH_THRESHOLD"), self.match_threshold);
        self.index_max_faces = parse_or(var("FACEMATCH_INDEX_MAX_FACES"), self.index_max_faces);
        self.search_max_faces =
            parse_or(var("FACEMATCH_SEARCH_MAX_FACES"), self.search_max_faces);
    }

    pub fn rekognition(&self) -> RekognitionConfig {
        RekognitionConfig {
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint: self.endpoint.clone(),
            ..RekognitionConfig::default()
        }
    }

    pub fn throttle(&self) -> FixedDelay {
        FixedDelay::new(Duration::from_millis(self.throttle_ms))
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            max_faces: self.index_max_faces,
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            threshold: self.match_threshold,
            max_faces: self.search_max_faces,
            portraits_dir: self.portraits_dir.clone(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
