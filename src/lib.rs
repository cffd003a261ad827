//a Rust-based moving-average backtesting engine for daily equity data

pub mod config;
pub mod data;
pub mod engine;
pub mod ledger;
pub mod metrics;
pub mod portfolio;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BacktestConfiguration, DualSmaParams, PriceSmaParams, StrategyKind, StrategyParams,
    };
    pub use crate::data::{filter_by_date_range, filter_by_symbol, load_csv, Bar};
    pub use crate::engine::{
        BacktestConfig, BacktestEngine, BacktestResult, ExecutionEngine, Fill, Order, OrderSide,
    };
    pub use crate::ledger::{FillRecord, LedgerError, PositionState, TradeRecord, TradeRecorder};
    pub use crate::metrics::{calculate_equity_curve, EquityPoint, SummaryMetrics};
    pub use crate::portfolio::{Account, Position};
    pub use crate::strategy::{
        price_sma::PriceSmaCrossStrategy, sma_cross::DualSmaCrossStrategy, Strategy,
        StrategyContext,
    };
}
