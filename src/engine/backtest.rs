use crate::data::Bar;
use crate::engine::execution::{ExecutionEngine, Fill};
use crate::ledger::{FillRecord, LedgerError, TradeRecord, TradeRecorder};
use crate::metrics::{calculate_equity_curve, EquityPoint, SummaryMetrics};
use crate::portfolio::Account;
use crate::strategy::{Strategy, StrategyContext};
use chrono::NaiveDateTime;
use std::collections::HashMap;

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub summary: SummaryMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub fills: Vec<FillRecord>,
}

//configuration for a backtest
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub max_lookback: usize,
    pub record_fills: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 100_000.0,
            commission_rate: 0.001,
            max_lookback: 500,
            record_fills: false,
        }
    }
}

//main backtest engine
//drives the strategy bar by bar, settles fills through the account,
//and feeds every fill and round-trip closure to the trade recorder
pub struct BacktestEngine {
    config: BacktestConfig,
    bars: Vec<Bar>,
    symbol: String,
    account: Account,
    execution: ExecutionEngine,
    recorder: TradeRecorder,
    equity_history: Vec<(NaiveDateTime, f64)>,

    //account snapshots taken when the position opens, so the close
    //notification carries the broker's round-trip figures
    realized_at_open: f64,
    commission_at_open: f64,
}

impl BacktestEngine {
    //creates a new backtest engine
    pub fn new(config: BacktestConfig, bars: Vec<Bar>, symbol: String) -> Self {
        let account = Account::new(config.initial_cash);
        let execution = ExecutionEngine::new(config.commission_rate);
        let recorder = TradeRecorder::new(config.record_fills);

        BacktestEngine {
            config,
            bars,
            symbol,
            account,
            execution,
            recorder,
            equity_history: Vec::new(),
            realized_at_open: 0.0,
            commission_at_open: 0.0,
        }
    }

    //runs the backtest with the given strategy
    //market orders submitted on one bar fill at the next bar's open,
    //before the strategy sees that bar
    pub fn run(&mut self, strategy: &mut Box<dyn Strategy>) -> Result<BacktestResult, LedgerError> {
        let mut context = StrategyContext::new(
            self.symbol.clone(),
            self.config.max_lookback,
            &mut self.execution as *mut ExecutionEngine,
            &mut self.account as *mut Account,
        );

        strategy.on_start(&mut context);

        //main backtest loop
        for i in 0..self.bars.len() {
            let bar = self.bars[i].clone();

            //fill orders pending from the previous bar at this bar's open
            if i > 0 {
                let fills = self.execution.process_orders(bar.timestamp, bar.open);
                for fill in fills {
                    self.route_fill(&fill)?;
                }
            }

            context.push_bar(bar.clone());
            strategy.on_bar(&mut context, &bar);

            //update account equity at the close
            let mut prices = HashMap::new();
            prices.insert(self.symbol.clone(), bar.close);
            self.account.update_equity(&prices);

            self.equity_history.push((bar.timestamp, self.account.equity));
        }

        //let the strategy close out, then settle remaining orders at the last close
        strategy.on_end(&mut context);

        if let Some(last_bar) = self.bars.last().cloned() {
            let fills = self
                .execution
                .process_orders(last_bar.timestamp, last_bar.close);
            for fill in fills {
                self.route_fill(&fill)?;
            }

            let mut prices = HashMap::new();
            prices.insert(self.symbol.clone(), last_bar.close);
            self.account.update_equity(&prices);

            if let Some(last) = self.equity_history.last_mut() {
                last.1 = self.account.equity;
            }
        }

        Ok(self.build_result())
    }

    //settles one fill through the account and notifies the recorder,
    //emitting the close notification when the position returns to flat
    fn route_fill(&mut self, fill: &Fill) -> Result<(), LedgerError> {
        let was_flat = self.account.position_qty(&fill.symbol) == 0;

        if was_flat {
            //snapshot the broker accumulators before the opening fill so the
            //round-trip figures include its commission
            self.realized_at_open = self.account.total_realized_pnl();
            self.commission_at_open = self.account.total_commission;
        }

        self.account.process_fill(fill);
        self.recorder.on_fill(fill)?;

        let now_flat = self.account.position_qty(&fill.symbol) == 0;

        if !was_flat && now_flat {
            //round trip complete: the broker figures are authoritative
            let gross_pnl = self.account.total_realized_pnl() - self.realized_at_open;
            let total_commission = self.account.total_commission - self.commission_at_open;

            self.recorder.on_position_closed(
                fill.timestamp,
                gross_pnl,
                gross_pnl - total_commission,
                total_commission,
            )?;
        }

        Ok(())
    }

    fn build_result(&self) -> BacktestResult {
        let timestamps: Vec<_> = self.equity_history.iter().map(|(t, _)| *t).collect();
        let equity_values: Vec<_> = self.equity_history.iter().map(|(_, e)| *e).collect();

        let equity_curve =
            calculate_equity_curve(&timestamps, &equity_values, self.config.initial_cash);

        let trades = self.recorder.trades().to_vec();
        let fills = self
            .recorder
            .fills()
            .map(|f| f.to_vec())
            .unwrap_or_default();

        let summary =
            SummaryMetrics::from_backtest(&equity_curve, &trades, self.config.initial_cash);

        BacktestResult {
            summary,
            equity_curve,
            trades,
            fills,
        }
    }

    //returns a reference to the account
    pub fn account(&self) -> &Account {
        &self.account
    }

    //returns a reference to the trade recorder
    pub fn recorder(&self) -> &TradeRecorder {
        &self.recorder
    }
}
