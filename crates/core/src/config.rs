use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub analysis: AnalysisConfig,
    pub data: DataConfig,
    pub ledger: LedgerConfig,
    pub backtest: BacktestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
            requests_per_minute: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_concurrent: usize,
    pub agent_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub price_window_days: i64,
    pub roles: Vec<RoleConfig>,
    pub debate: DebateConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            agent_timeout_secs: 60,
            max_retries: 2,
            retry_base_delay_ms: 500,
            price_window_days: 60,
            roles: vec![
                RoleConfig::new("fundamental", 1.0),
                RoleConfig::new("technical", 1.0),
                RoleConfig::new("sentiment", 0.8),
                RoleConfig::new("news", 0.8),
                RoleConfig::new("risk", 0.6),
            ],
            debate: DebateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub role: String,
    pub weight: f64,
    pub enabled: bool,
}

impl RoleConfig {
    #[must_use]
    pub fn new(role: impl Into<String>, weight: f64) -> Self {
        Self {
            role: role.into(),
            weight,
            enabled: true,
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self::new("", 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    pub enabled: bool,
    pub bull_weight: f64,
    pub bear_weight: f64,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bull_weight: 0.7,
            bear_weight: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub csv_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            csv_dir: "data/prices".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: "data/ledger.jsonl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub capital: f64,
    pub fee_bps: u32,
    pub execution_delay_days: u32,
    pub sizing_fraction: f64,
    pub allow_short: bool,
    pub averaging_in: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            capital: 10_000.0,
            fee_bps: 0,
            execution_delay_days: 1,
            sizing_fraction: 1.0,
            allow_short: false,
            averaging_in: false,
        }
    }
}
