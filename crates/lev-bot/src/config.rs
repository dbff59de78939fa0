//! Application configuration.

use crate::error::{AppError, AppResult};
use lev_core::{OrderSide, Size, Symbol, SymbolRules};
use lev_executor::{ExecutorConfig, LeverageFailurePolicy, RunPlan, DEFAULT_SYNC_TOLERANCE_MS};
use lev_gateway::DEMO_BASE_URL;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config path used when neither `--config` nor `LEV_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "LEV_CONFIG";

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file.
    File(String),
    /// No file at this path; defaults were used.
    Defaults { missing_path: String },
}

/// One market to trade in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Exchange symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// Order side. Default: buy.
    #[serde(default)]
    pub side: OrderSide,
    /// Fraction of available balance committed as margin, in (0, 1].
    pub allocation: Decimal,
    /// Leverage multiplier, at least 1.
    pub leverage: u32,
    /// Minimum order quantity. Overrides exchange metadata when set.
    #[serde(default)]
    pub min_qty: Option<Decimal>,
    /// Quantity increment. Overrides exchange metadata when set.
    #[serde(default)]
    pub step_size: Option<Decimal>,
}

impl MarketConfig {
    /// Configured quantity rules, if any.
    ///
    /// A market setting only one of `min_qty`/`step_size` takes the other
    /// from [`SymbolRules::FALLBACK`].
    pub fn rules(&self) -> AppResult<Option<SymbolRules>> {
        if self.min_qty.is_none() && self.step_size.is_none() {
            return Ok(None);
        }
        let min = self
            .min_qty
            .map(Size::new)
            .unwrap_or(SymbolRules::FALLBACK.min_quantity);
        let step = self
            .step_size
            .map(Size::new)
            .unwrap_or(SymbolRules::FALLBACK.step_size);
        SymbolRules::new(min, step)
            .map(Some)
            .map_err(|e| AppError::Config(format!("{}: {e}", self.symbol)))
    }

    /// Validated run plan for this market.
    pub fn run_plan(&self) -> AppResult<RunPlan> {
        let symbol = Symbol::parse(&self.symbol)
            .map_err(|e| AppError::Config(format!("Invalid market symbol: {e}")))?;
        Ok(RunPlan::new(
            symbol,
            self.side,
            self.allocation,
            self.leverage,
        )?)
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directives. `RUST_LOG` takes precedence.
    #[serde(default)]
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// REST root of the futures API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for each remote call (ms). Default: 10,000.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Clock offset tolerated by the sync probe (ms). Default: 50.
    #[serde(default = "default_sync_tolerance_ms")]
    pub sync_tolerance_ms: u64,
    /// Validity window for signed requests (ms). Default: 5,000.
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
    /// Leverage-set failure handling. Default: continue.
    #[serde(default)]
    pub leverage_failure: LeverageFailurePolicy,
    /// Asset funding the margin. Default: "USDT".
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    /// Fetch quantity rules from exchange metadata for markets without
    /// configured rules. Default: false.
    #[serde(default)]
    pub fetch_symbol_rules: bool,
    /// Markets to trade. Default: BTCUSDT buy, 10% allocation, 10x.
    #[serde(default = "default_markets")]
    pub markets: Vec<MarketConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_base_url() -> String {
    DEMO_BASE_URL.to_string()
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_sync_tolerance_ms() -> u64 {
    DEFAULT_SYNC_TOLERANCE_MS
}

fn default_recv_window_ms() -> u64 {
    5_000
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}

fn default_markets() -> Vec<MarketConfig> {
    vec![MarketConfig {
        symbol: "BTCUSDT".to_string(),
        side: OrderSide::Buy,
        allocation: Decimal::new(10, 2),
        leverage: 10,
        min_qty: None,
        step_size: None,
    }]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            call_timeout_ms: default_call_timeout_ms(),
            sync_tolerance_ms: default_sync_tolerance_ms(),
            recv_window_ms: default_recv_window_ms(),
            leverage_failure: LeverageFailurePolicy::default(),
            quote_asset: default_quote_asset(),
            fetch_symbol_rules: false,
            markets: default_markets(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Path precedence: `cli_path` > `LEV_CONFIG` > `config/default.toml`.
    /// A missing file yields the defaults. The returned [`ConfigSource`] says
    /// which happened, so the caller can log it once logging is up.
    pub fn load(cli_path: Option<&str>) -> AppResult<(Self, ConfigSource)> {
        let config_path = cli_path
            .map(str::to_string)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            let config = Self::from_file(&config_path)?;
            Ok((config, ConfigSource::File(config_path)))
        } else {
            Ok((
                Self::default(),
                ConfigSource::Defaults {
                    missing_path: config_path,
                },
            ))
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every run fail.
    pub fn validate(&self) -> AppResult<()> {
        if self.markets.is_empty() {
            return Err(AppError::Config("No markets configured".to_string()));
        }
        if self.call_timeout_ms == 0 {
            return Err(AppError::Config(
                "call_timeout_ms must be positive".to_string(),
            ));
        }
        if self.quote_asset.trim().is_empty() {
            return Err(AppError::Config("quote_asset must not be empty".to_string()));
        }
        for market in &self.markets {
            market.run_plan()?;
            market.rules()?;
        }
        Ok(())
    }

    /// Per-call timeout.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Executor configuration derived from this config.
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            call_timeout: self.call_timeout(),
            leverage_failure: self.leverage_failure,
            quote_asset: self.quote_asset.to_uppercase(),
            fetch_symbol_rules: self.fetch_symbol_rules,
        }
    }
}
