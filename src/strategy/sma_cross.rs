use crate::data::Bar;
use crate::engine::execution::OrderSide;
use crate::strategy::{sma, Strategy, StrategyContext};

//dual sma crossover strategy, long only
//buys a fixed stake when the fast sma crosses above the slow sma
//sells the whole position when the fast sma crosses below
#[derive(Debug, Clone)]
pub struct DualSmaCrossStrategy {
    fast_window: usize,
    slow_window: usize,
    stake: u32,

    //state
    last_fast_sma: Option<f64>,
    last_slow_sma: Option<f64>,
}

impl DualSmaCrossStrategy {
    pub fn new(fast_window: usize, slow_window: usize, stake: u32) -> Self {
        DualSmaCrossStrategy {
            fast_window,
            slow_window,
            stake,
            last_fast_sma: None,
            last_slow_sma: None,
        }
    }

    //checks for crossover against the previous bar's smas
    fn check_crossover(&self, fast_sma: f64, slow_sma: f64) -> Option<OrderSide> {
        if let (Some(prev_fast), Some(prev_slow)) = (self.last_fast_sma, self.last_slow_sma) {
            //bullish crossover: fast crosses above slow
            if prev_fast <= prev_slow && fast_sma > slow_sma {
                return Some(OrderSide::Buy);
            }
            //bearish crossover: fast crosses below slow
            if prev_fast >= prev_slow && fast_sma < slow_sma {
                return Some(OrderSide::Sell);
            }
        }
        None
    }
}

impl Strategy for DualSmaCrossStrategy {
    fn on_start(&mut self, _context: &mut StrategyContext) {
        self.last_fast_sma = None;
        self.last_slow_sma = None;
    }

    fn on_bar(&mut self, context: &mut StrategyContext, _bar: &Bar) {
        //need at least slow_window bars to calculate
        if context.bar_count() < self.slow_window {
            return;
        }

        let closes = context.get_close_prices(self.slow_window);
        let fast_prices = &closes[closes.len().saturating_sub(self.fast_window)..];

        let fast_sma = match sma(fast_prices) {
            Some(v) => v,
            None => return,
        };
        let slow_sma = match sma(&closes) {
            Some(v) => v,
            None => return,
        };

        if let Some(signal) = self.check_crossover(fast_sma, slow_sma) {
            let held = context.position_qty();

            match signal {
                OrderSide::Buy => {
                    //enter long only from flat
                    if held == 0 {
                        context.market_order(self.stake, OrderSide::Buy);
                    }
                }
                OrderSide::Sell => {
                    //exit the whole position, never go short
                    if held > 0 {
                        context.market_order(held as u32, OrderSide::Sell);
                    }
                }
            }
        }

        self.last_fast_sma = Some(fast_sma);
        self.last_slow_sma = Some(slow_sma);
    }

    fn on_end(&mut self, context: &mut StrategyContext) {
        //close any open position at the last bar
        let held = context.position_qty();
        if held > 0 {
            context.market_order(held as u32, OrderSide::Sell);
        }
    }

    fn name(&self) -> &str {
        "Dual-SMA Crossover"
    }
}
