pub mod price_sma;
pub mod sma_cross;

use crate::data::Bar;
use crate::engine::execution::{ExecutionEngine, OrderSide};
use crate::portfolio::Account;
use chrono::NaiveDateTime;
use std::collections::VecDeque;

//strategy interface that all strategies must implement
pub trait Strategy: Send {
    //called once at the start of the backtest
    fn on_start(&mut self, context: &mut StrategyContext);

    //called on each new bar
    fn on_bar(&mut self, context: &mut StrategyContext, bar: &Bar);

    //called at the end of the backtest
    fn on_end(&mut self, context: &mut StrategyContext);

    //returns the strategy name
    fn name(&self) -> &str;
}

//context providing access to market data and order submission
pub struct StrategyContext {
    //symbol being traded
    pub symbol: String,

    //historical bars (ring buffer with limited lookback)
    bar_history: VecDeque<Bar>,

    //maximum bars to keep in history
    max_history: usize,

    //current timestamp
    pub current_time: NaiveDateTime,

    //reference to execution engine
    execution_engine: *mut ExecutionEngine,

    //reference to account
    account: *mut Account,
}

impl StrategyContext {
    //creates a new strategy context
    pub fn new(
        symbol: String,
        max_history: usize,
        execution_engine: *mut ExecutionEngine,
        account: *mut Account,
    ) -> Self {
        StrategyContext {
            symbol,
            bar_history: VecDeque::with_capacity(max_history),
            max_history,
            current_time: NaiveDateTime::MIN,
            execution_engine,
            account,
        }
    }

    //adds a bar to the history
    pub fn push_bar(&mut self, bar: Bar) {
        self.current_time = bar.timestamp;

        if self.bar_history.len() >= self.max_history {
            self.bar_history.pop_front();
        }
        self.bar_history.push_back(bar);
    }

    //returns the last n bars (oldest first)
    pub fn get_bars(&self, n: usize) -> Vec<&Bar> {
        let len = self.bar_history.len();
        let start = len.saturating_sub(n);
        self.bar_history.range(start..).collect()
    }

    //returns the most recent bar
    pub fn last_bar(&self) -> Option<&Bar> {
        self.bar_history.back()
    }

    //returns the close prices for the last n bars
    pub fn get_close_prices(&self, n: usize) -> Vec<f64> {
        let bars = self.get_bars(n);
        bars.iter().map(|b| b.close).collect()
    }

    //submits a market order for the context's symbol
    pub fn market_order(&mut self, quantity: u32, side: OrderSide) -> u64 {
        unsafe {
            (*self.execution_engine).market_order(
                self.current_time,
                self.symbol.clone(),
                quantity,
                side,
            )
        }
    }

    //returns the net quantity held in the strategy's symbol
    pub fn position_qty(&self) -> i64 {
        unsafe { (*self.account).position_qty(&self.symbol) }
    }

    //returns the current cash balance
    pub fn cash(&self) -> f64 {
        unsafe { (*self.account).cash }
    }

    //returns the current equity
    pub fn equity(&self) -> f64 {
        unsafe { (*self.account).equity }
    }

    //returns the number of bars in history
    pub fn bar_count(&self) -> usize {
        self.bar_history.len()
    }
}

//helper function to calculate simple moving average
pub fn sma(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}
