use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How traversal counts become path weights for closeness.
///
/// There is no default: callers must pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightPolicy {
    /// Path weight = `traverse_count`.
    Raw,
    /// Path weight = `max_traverse_count - traverse_count`.
    Inverted,
}

impl WeightPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Inverted => "inverted",
        }
    }
}

impl fmt::Display for WeightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "inverted" | "inverse" => Ok(Self::Inverted),
            other => Err(format!("unknown weighting '{other}' (expected raw|inverted)")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinemapConfig {
    #[serde(default)]
    pub closeness: ClosenessConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosenessConfig {
    #[serde(default)]
    pub weighting: Option<WeightPolicy>,
    #[serde(default = "default_true")]
    pub normalized: bool,
}

impl Default for ClosenessConfig {
    fn default() -> Self {
        Self {
            weighting: None,
            normalized: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_output_size")]
    pub output_size: u32,
    #[serde(default = "default_vertex_size_max")]
    pub vertex_size_max: f64,
    #[serde(default = "default_vertex_size_min")]
    pub vertex_size_min: f64,
    #[serde(default = "default_edge_width_max")]
    pub edge_width_max: f64,
    #[serde(default = "default_edge_width_min")]
    pub edge_width_min: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_size: default_output_size(),
            vertex_size_max: default_vertex_size_max(),
            vertex_size_min: default_vertex_size_min(),
            edge_width_max: default_edge_width_max(),
            edge_width_min: default_edge_width_min(),
            seed: default_seed(),
            format: default_format(),
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { top: default_top() }
    }
}

/// Where the effective config came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    Defaults,
}

/// Load a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML for
/// [`LinemapConfig`].
pub fn load_config(path: &Path) -> Result<LinemapConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<LinemapConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective config.
///
/// Precedence: `explicit` path → `<project_root>/linemap.toml` →
/// `<user config dir>/linemap/config.toml` → defaults. Only the first file
/// found is read; files are not merged.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed. A missing
/// `explicit` file is an error; missing implicit files are skipped.
pub fn resolve_config(
    explicit: Option<&Path>,
    project_root: &Path,
) -> Result<(LinemapConfig, ConfigSource)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, ConfigSource::Explicit(path.to_path_buf())));
    }

    let project = project_root.join("linemap.toml");
    if project.exists() {
        return Ok((load_config(&project)?, ConfigSource::Project(project)));
    }

    if let Some(config_dir) = dirs::config_dir() {
        let user = config_dir.join("linemap/config.toml");
        if user.exists() {
            return Ok((load_config(&user)?, ConfigSource::User(user)));
        }
    }

    Ok((LinemapConfig::default(), ConfigSource::Defaults))
}

const fn default_true() -> bool {
    true
}

const fn default_output_size() -> u32 {
    400
}

const fn default_vertex_size_max() -> f64 {
    20.0
}

const fn default_vertex_size_min() -> f64 {
    10.0
}

const fn default_edge_width_max() -> f64 {
    5.0
}

const fn default_edge_width_min() -> f64 {
    2.5
}

const fn default_seed() -> u64 {
    42
}

fn default_format() -> String {
    "svg".to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("output")
}

const fn default_top() -> usize {
    10
}
