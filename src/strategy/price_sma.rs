use crate::data::Bar;
use crate::engine::execution::OrderSide;
use crate::strategy::{sma, Strategy, StrategyContext};

//price vs sma crossover strategy, long only
//buys a fixed stake when close crosses above sma(period)
//sells the whole position when close crosses below
#[derive(Debug, Clone)]
pub struct PriceSmaCrossStrategy {
    ma_period: usize,
    stake: u32,

    //state
    last_close: Option<f64>,
    last_sma: Option<f64>,
}

impl PriceSmaCrossStrategy {
    pub fn new(ma_period: usize, stake: u32) -> Self {
        PriceSmaCrossStrategy {
            ma_period,
            stake,
            last_close: None,
            last_sma: None,
        }
    }

    //checks for a close/sma crossover against the previous bar
    fn check_crossover(&self, close: f64, sma_now: f64) -> Option<OrderSide> {
        if let (Some(prev_close), Some(prev_sma)) = (self.last_close, self.last_sma) {
            //up-cross: close moves from at-or-below the sma to above it
            if prev_close <= prev_sma && close > sma_now {
                return Some(OrderSide::Buy);
            }
            //down-cross: close moves from at-or-above the sma to below it
            if prev_close >= prev_sma && close < sma_now {
                return Some(OrderSide::Sell);
            }
        }
        None
    }
}

impl Strategy for PriceSmaCrossStrategy {
    fn on_start(&mut self, _context: &mut StrategyContext) {
        self.last_close = None;
        self.last_sma = None;
    }

    fn on_bar(&mut self, context: &mut StrategyContext, bar: &Bar) {
        //need at least ma_period bars to calculate
        if context.bar_count() < self.ma_period {
            return;
        }

        let closes = context.get_close_prices(self.ma_period);
        let sma_now = match sma(&closes) {
            Some(v) => v,
            None => return,
        };

        if let Some(signal) = self.check_crossover(bar.close, sma_now) {
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

        self.last_close = Some(bar.close);
        self.last_sma = Some(sma_now);
    }

    fn on_end(&mut self, context: &mut StrategyContext) {
        //close any open position at the last bar
        let held = context.position_qty();
        if held > 0 {
            context.market_order(held as u32, OrderSide::Sell);
        }
    }

    fn name(&self) -> &str {
        "Price-SMA Cross"
    }
}
