//end-to-end backtests over a synthetic plateau series:
//flat at 10, step up to 30, step back down to 20
//the price crosses its sma once in each direction, giving one round trip

use chrono::{NaiveDate, NaiveDateTime};
use quantlab::prelude::*;
use std::io::Write;

fn ts(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn plateau_csv() -> String {
    //(open, close) per day; highs and lows padded around them
    let days: Vec<(u32, f64, f64)> = vec![
        (4, 10.0, 10.0),
        (5, 10.0, 10.0),
        (6, 10.0, 10.0),
        (7, 10.0, 10.0),
        (8, 10.0, 20.0),
        (9, 20.0, 30.0),
        (10, 30.0, 30.0),
        (11, 30.0, 30.0),
        (12, 30.0, 20.0),
        (13, 25.0, 20.0),
        (14, 20.0, 20.0),
    ];

    let mut csv = String::from("timestamp,open,high,low,close,volume,symbol\n");
    for (day, open, close) in days {
        let high = open.max(close) + 0.5;
        let low = open.min(close) - 0.5;
        csv.push_str(&format!(
            "2021-01-{:02},{},{},{},{},1000,AAPL\n",
            day, open, high, low, close
        ));
    }
    csv
}

fn load_plateau_bars() -> Vec<Bar> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(plateau_csv().as_bytes()).unwrap();

    let bars = load_csv(file.path()).unwrap();
    filter_by_symbol(&bars, "AAPL")
}

#[test]
fn price_sma_strategy_completes_one_round_trip() {
    let bars = load_plateau_bars();
    assert_eq!(bars.len(), 11);

    let config = BacktestConfig {
        initial_cash: 100_000.0,
        commission_rate: 0.001,
        max_lookback: 500,
        record_fills: true,
    };

    let mut strategy: Box<dyn Strategy> = Box::new(PriceSmaCrossStrategy::new(3, 100));
    let mut engine = BacktestEngine::new(config, bars, "AAPL".to_string());
    let result = engine.run(&mut strategy).unwrap();

    //up-cross signals on jan 8, fills at jan 9's open of 20
    //down-cross signals on jan 12, fills at jan 13's open of 25
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_time, ts(9));
    assert_eq!(trade.exit_time, ts(13));
    assert_eq!(trade.peak_quantity, 100);
    assert!((trade.average_entry_cost - 20.0).abs() < 1e-9);
    assert!((trade.gross_pnl - 500.0).abs() < 1e-9);
    //commission: 0.001 * (20*100 + 25*100)
    assert!((trade.total_commission - 4.5).abs() < 1e-9);
    assert!((trade.net_pnl - 495.5).abs() < 1e-9);
    assert_eq!(trade.fill_count, 2);

    //fill log was enabled and spans both sides of the round trip
    assert_eq!(result.fills.len(), 2);
    assert_eq!(result.fills[0].side, OrderSide::Buy);
    assert!((result.fills[0].price - 20.0).abs() < 1e-9);
    assert_eq!(result.fills[1].side, OrderSide::Sell);
    assert!((result.fills[1].price - 25.0).abs() < 1e-9);

    //account settled flat with the trade's net pnl
    assert_eq!(engine.account().position_qty("AAPL"), 0);
    let final_equity = result.equity_curve.last().unwrap().equity;
    assert!((final_equity - 100_495.5).abs() < 1e-9);

    //net pnl equals gross minus commission on every closed trade
    for trade in &result.trades {
        assert!((trade.net_pnl - (trade.gross_pnl - trade.total_commission)).abs() < 1e-9);
    }

    assert_eq!(result.summary.num_trades, 1);
    assert_eq!(result.summary.num_winning_trades, 1);
    assert!((result.summary.net_pnl - 495.5).abs() < 1e-9);
    assert!(result.summary.exposure > 0.0);
}

#[test]
fn dual_sma_strategy_completes_one_round_trip() {
    let bars = load_plateau_bars();

    let config = BacktestConfig {
        initial_cash: 100_000.0,
        commission_rate: 0.001,
        max_lookback: 500,
        record_fills: false,
    };

    let mut strategy: Box<dyn Strategy> = Box::new(DualSmaCrossStrategy::new(2, 3, 50));
    let mut engine = BacktestEngine::new(config, bars, "AAPL".to_string());
    let result = engine.run(&mut strategy).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.peak_quantity, 50);
    assert!((trade.average_entry_cost - 20.0).abs() < 1e-9);
    assert!((trade.gross_pnl - 250.0).abs() < 1e-9);
    //commission: 0.001 * (20*50 + 25*50)
    assert!((trade.total_commission - 2.25).abs() < 1e-9);
    assert!((trade.net_pnl - 247.75).abs() < 1e-9);

    //fill log was not enabled
    assert!(result.fills.is_empty());
    assert!(engine.recorder().is_flat());
}

#[test]
fn zero_commission_zero_move_trade_has_zero_pnl() {
    //flat series with a single forced round trip via on_end close-out
    struct BuyOnce {
        bought: bool,
    }

    impl Strategy for BuyOnce {
        fn on_start(&mut self, _context: &mut StrategyContext) {}

        fn on_bar(&mut self, context: &mut StrategyContext, _bar: &Bar) {
            if !self.bought && context.bar_count() == 1 {
                context.market_order(100, OrderSide::Buy);
                self.bought = true;
            }
        }

        fn on_end(&mut self, context: &mut StrategyContext) {
            let held = context.position_qty();
            if held > 0 {
                context.market_order(held as u32, OrderSide::Sell);
            }
        }

        fn name(&self) -> &str {
            "Buy Once"
        }
    }

    let bars: Vec<Bar> = (4..9)
        .map(|day| Bar::new_unchecked(ts(day), 10.0, 10.5, 9.5, 10.0, 1000.0, "AAPL".to_string()))
        .collect();

    let config = BacktestConfig {
        initial_cash: 10_000.0,
        commission_rate: 0.0,
        max_lookback: 500,
        record_fills: false,
    };

    let mut strategy: Box<dyn Strategy> = Box::new(BuyOnce { bought: false });
    let mut engine = BacktestEngine::new(config, bars, "AAPL".to_string());
    let result = engine.run(&mut strategy).unwrap();

    //buy at 10, close out at 10: zero gross, zero commission, zero net
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert!(trade.gross_pnl.abs() < 1e-9);
    assert!(trade.total_commission.abs() < 1e-9);
    assert!(trade.net_pnl.abs() < 1e-9);

    let final_equity = result.equity_curve.last().unwrap().equity;
    assert!((final_equity - 10_000.0).abs() < 1e-9);
}

#[test]
fn overselling_strategy_aborts_the_run() {
    //a broken sizer that sells without holding anything
    struct SellFirst {
        sold: bool,
    }

    impl Strategy for SellFirst {
        fn on_start(&mut self, _context: &mut StrategyContext) {}

        fn on_bar(&mut self, context: &mut StrategyContext, _bar: &Bar) {
            if !self.sold {
                context.market_order(10, OrderSide::Sell);
                self.sold = true;
            }
        }

        fn on_end(&mut self, _context: &mut StrategyContext) {}

        fn name(&self) -> &str {
            "Sell First"
        }
    }

    let bars: Vec<Bar> = (4..8)
        .map(|day| Bar::new_unchecked(ts(day), 10.0, 10.5, 9.5, 10.0, 1000.0, "AAPL".to_string()))
        .collect();

    let mut strategy: Box<dyn Strategy> = Box::new(SellFirst { sold: false });
    let mut engine = BacktestEngine::new(BacktestConfig::default(), bars, "AAPL".to_string());
    let err = engine.run(&mut strategy).unwrap_err();

    assert_eq!(
        err,
        LedgerError::OverSell {
            requested: 10,
            held: 0
        }
    );
}
