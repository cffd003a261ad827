use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

//strategy variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    PriceSmaCross,
    DualSmaCross,
}

impl StrategyKind {
    //parse strategy kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "price_sma" | "ma_cross" => Some(StrategyKind::PriceSmaCross),
            "sma_cross" | "dual_sma" => Some(StrategyKind::DualSmaCross),
            _ => None,
        }
    }

    //short name used for output file prefixes
    pub fn slug(&self) -> &'static str {
        match self {
            StrategyKind::PriceSmaCross => "price_sma",
            StrategyKind::DualSmaCross => "sma_cross",
        }
    }
}

//price vs sma strategy parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSmaParams {
    pub ma_period: usize,
    pub stake: u32,
}

impl Default for PriceSmaParams {
    fn default() -> Self {
        PriceSmaParams {
            ma_period: 20,
            stake: 100,
        }
    }
}

//dual sma crossover strategy parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualSmaParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub stake: u32,
}

impl Default for DualSmaParams {
    fn default() -> Self {
        DualSmaParams {
            fast_window: 20,
            slow_window: 50,
            stake: 100,
        }
    }
}

//strategy-specific parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StrategyParams {
    PriceSma(PriceSmaParams),
    DualSma(DualSmaParams),
}

//complete backtest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    //data
    pub data_path: PathBuf,
    pub symbol: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,

    //account settings
    pub initial_cash: f64,
    pub commission_rate: f64,

    //strategy
    pub strategy_kind: StrategyKind,
    pub strategy_params: StrategyParams,

    //output
    pub export_fills: bool,
    pub outdir: PathBuf,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            data_path: PathBuf::from("data.csv"),
            symbol: "AAPL".to_string(),
            start: None,
            end: None,
            initial_cash: 100_000.0,
            commission_rate: 0.001,
            strategy_kind: StrategyKind::PriceSmaCross,
            strategy_params: StrategyParams::PriceSma(PriceSmaParams::default()),
            export_fills: false,
            outdir: PathBuf::from("results"),
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &PathBuf) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
