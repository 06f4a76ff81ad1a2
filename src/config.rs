use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::SimulationRequest;
use crate::controller::StalePolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub executive: ExecutiveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Unset means requests never time out.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_cost_fn")]
    pub cost_fn: f64,
    #[serde(default = "default_cost_fp")]
    pub cost_fp: f64,
    #[serde(default = "default_true")]
    pub discard_stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_cost_fn")]
    pub cost_fn: f64,
    #[serde(default = "default_cost_fp")]
    pub cost_fp: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub threshold: Option<f64>,
    pub cost_fn: Option<f64>,
    pub cost_fp: Option<f64>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/sla-risk-console/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.api.base_url = base_url;
        }
        if let Some(threshold) = overrides.threshold {
            self.simulation.threshold = threshold;
        }
        if let Some(cost_fn) = overrides.cost_fn {
            self.simulation.cost_fn = cost_fn;
        }
        if let Some(cost_fp) = overrides.cost_fp {
            self.simulation.cost_fp = cost_fp;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn default_template() -> String {
        let template = r#"[api]
base_url = "http://127.0.0.1:8000"
user_agent = "sla-risk-console/0.1"
# timeout_secs = 30

[simulation]
threshold = 0.5
cost_fn = 50000.0
cost_fp = 10000.0
discard_stale = true

[executive]
threshold = 0.5
cost_fn = 50000.0
cost_fp = 10000.0
"#;
        template.to_string()
    }
}

impl SimulationConfig {
    pub fn stale_policy(&self) -> StalePolicy {
        if self.discard_stale {
            StalePolicy::DiscardStale
        } else {
            StalePolicy::ApplyInArrivalOrder
        }
    }
}

impl ExecutiveConfig {
    pub fn request(&self) -> SimulationRequest {
        SimulationRequest {
            threshold: self.threshold,
            cost_fn: self.cost_fn,
            cost_fp: self.cost_fp,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            cost_fn: default_cost_fn(),
            cost_fp: default_cost_fp(),
            discard_stale: true,
        }
    }
}

impl Default for ExecutiveConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            cost_fn: default_cost_fn(),
            cost_fp: default_cost_fp(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_user_agent() -> String {
    format!("sla-risk-console/{}", env!("CARGO_PKG_VERSION"))
}

fn default_threshold() -> f64 {
    0.5
}

fn default_cost_fn() -> f64 {
    50_000.0
}

fn default_cost_fp() -> f64 {
    10_000.0
}

fn default_true() -> bool {
    true
}
