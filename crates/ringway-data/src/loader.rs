//! Resolution pipeline: reads scenario files, resolves city names, and
//! produces validated engine configuration.
//!
//! A scenario directory holds up to three files, each in RON, TOML or JSON:
//!
//! - `scenario` (required) -- cities, corridors and the initial fleet
//! - `tuning` (optional) -- a [`SimConfig`]; defaults apply when absent
//! - `demand` (optional) -- an hourly/weekday demand profile
//!
//! Provides format detection, file discovery, and deserialization helpers
//! used by [`load_scenario`].

use log::debug;
use ringway_core::config::{CityConfig, PipelineConfig, ScenarioConfig, SimConfig};
use ringway_core::demand::{HourlyProfile, RouteDemand};
use ringway_core::engine::Engine;
use ringway_core::error::ConfigError;
use ringway_core::id::CityId;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::schema::{DemandData, ScenarioData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The resolved configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name in a map, returning an `UnresolvedRef` error if not found.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Check whether a name already exists in a map, returning a `DuplicateName`
/// error if so.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

// ===========================================================================
// Scenario resolution
// ===========================================================================

/// Everything needed to build an [`Engine`] from a scenario directory.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedScenario {
    pub config: SimConfig,
    pub scenario: ScenarioConfig,
    pub demand: Option<HourlyProfile>,
}

impl LoadedScenario {
    /// Build the engine and install the demand profile, if any.
    pub fn into_engine(self) -> Result<Engine, ConfigError> {
        let mut engine = Engine::new(self.config, self.scenario)?;
        if let Some(profile) = self.demand {
            engine.set_demand(Box::new(profile));
        }
        Ok(engine)
    }
}

/// Load and validate the scenario directory at `dir`.
pub fn load_scenario(dir: &Path) -> Result<LoadedScenario, DataLoadError> {
    let scenario_path = require_data_file(dir, "scenario")?;
    let data: ScenarioData = deserialize_file(&scenario_path)?;
    let scenario = resolve_scenario(data, &scenario_path)?;

    let config = match find_data_file(dir, "tuning")? {
        Some(path) => deserialize_file::<SimConfig>(&path)?,
        None => SimConfig::default(),
    };

    let demand = match find_data_file(dir, "demand")? {
        Some(path) => {
            let data: DemandData = deserialize_file(&path)?;
            Some(resolve_demand(data, &scenario, &path)?)
        }
        None => None,
    };

    config.validate()?;
    scenario.validate(&config.geometry)?;
    if let Some(profile) = &demand {
        profile.validate()?;
    }

    debug!(
        "loaded scenario '{}' from {}: {} cities, {} pipelines, demand: {}",
        scenario.name,
        dir.display(),
        scenario.cities.len(),
        scenario.pipelines.len(),
        demand.is_some()
    );
    Ok(LoadedScenario {
        config,
        scenario,
        demand,
    })
}

/// Assign city ids in file order and resolve corridor endpoints by name.
pub fn resolve_scenario(data: ScenarioData, file: &Path) -> Result<ScenarioConfig, DataLoadError> {
    let mut city_ids: HashMap<String, CityId> = HashMap::new();
    let mut cities = Vec::with_capacity(data.cities.len());

    for (index, city) in data.cities.into_iter().enumerate() {
        check_duplicate(&city_ids, &city.name, file)?;
        city_ids.insert(city.name.clone(), CityId(index as u32));
        cities.push(CityConfig {
            name: city.name,
            gates: city.gates,
            gate_distance: city.gate_distance,
            gate_offset: city.gate_offset,
        });
    }

    let pipelines = data
        .pipelines
        .into_iter()
        .map(|p| {
            Ok(PipelineConfig {
                from: *resolve_name(&city_ids, &p.from, file, "city")?,
                to: *resolve_name(&city_ids, &p.to, file, "city")?,
                capacity: p.capacity,
                transit_time: p.transit_time,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    Ok(ScenarioConfig {
        name: data.name,
        cities,
        pipelines,
        fleet: data.fleet,
    })
}

/// Resolve route endpoints against the cities of `scenario`.
pub fn resolve_demand(
    data: DemandData,
    scenario: &ScenarioConfig,
    file: &Path,
) -> Result<HourlyProfile, DataLoadError> {
    let city_ids: HashMap<String, CityId> = scenario
        .cities
        .iter()
        .enumerate()
        .map(|(index, city)| (city.name.clone(), CityId(index as u32)))
        .collect();

    let routes = data
        .routes
        .into_iter()
        .map(|r| {
            Ok(RouteDemand {
                from: *resolve_name(&city_ids, &r.from, file, "city")?,
                to: *resolve_name(&city_ids, &r.to, file, "city")?,
                flights: r.flights,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;

    Ok(HourlyProfile {
        hourly: data.hourly,
        daily: data.daily,
        routes,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
