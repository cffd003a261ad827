use crate::ledger::TradeRecord;
use crate::metrics::timeseries::{calculate_returns, max_drawdown, EquityPoint};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics for a backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_cash: f64,
    pub final_value: f64,
    pub net_pnl: f64,
    pub total_return_pct: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub num_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_commission: f64,
    pub exposure: f64,
}

impl SummaryMetrics {
    //calculate summary metrics from the equity curve and the closed-trade log
    pub fn from_backtest(
        equity_curve: &[EquityPoint],
        trades: &[TradeRecord],
        initial_cash: f64,
    ) -> Self {
        let final_value = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_cash);

        let net_pnl = final_value - initial_cash;
        let total_return_pct = net_pnl / initial_cash;

        //calculate cagr
        let cagr = if equity_curve.len() >= 2 {
            let start_time = equity_curve.first().unwrap().timestamp;
            let end_time = equity_curve.last().unwrap().timestamp;
            let duration_days = (end_time - start_time).num_days() as f64;
            let years = duration_days / 365.25;

            if years > 0.0 {
                ((final_value / initial_cash).powf(1.0 / years) - 1.0) * 100.0
            } else {
                0.0
            }
        } else {
            0.0
        };

        //max drawdown
        let max_dd = max_drawdown(equity_curve);

        //calculate returns for sharpe and sortino
        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = calculate_returns(&equity_values);

        let sharpe = calculate_sharpe_ratio(&returns);
        let sortino = calculate_sortino_ratio(&returns);

        //trade statistics straight off the closed-trade log
        let trade_stats = calculate_trade_statistics(trades);

        //percentage of bars spent with an open position
        let exposure = calculate_exposure(equity_curve, trades);

        let total_commission = trades.iter().map(|t| t.total_commission).sum();

        SummaryMetrics {
            initial_cash,
            final_value,
            net_pnl,
            total_return_pct,
            cagr,
            max_drawdown: max_dd,
            sharpe_ratio: sharpe,
            sortino_ratio: sortino,
            win_rate: trade_stats.win_rate,
            avg_win: trade_stats.avg_win,
            avg_loss: trade_stats.avg_loss,
            profit_factor: trade_stats.profit_factor,
            num_trades: trade_stats.num_trades,
            num_winning_trades: trade_stats.num_winning_trades,
            num_losing_trades: trade_stats.num_losing_trades,
            largest_win: trade_stats.largest_win,
            largest_loss: trade_stats.largest_loss,
            total_commission,
            exposure,
        }
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        table.add_row(Row::new(vec![
            Cell::new("Initial Cash"),
            Cell::new(&format!("${:.2}", self.initial_cash)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Final Value"),
            Cell::new(&format!("${:.2}", self.final_value)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Net P/L"),
            Cell::new(&format!(
                "${:.2} ({:.2}%)",
                self.net_pnl,
                self.total_return_pct * 100.0
            )),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("CAGR"),
            Cell::new(&format!("{:.2}%", self.cagr)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Max Drawdown"),
            Cell::new(&format!("{:.2}%", self.max_drawdown * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Sharpe Ratio"),
            Cell::new(&format!("{:.3}", self.sharpe_ratio)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Sortino Ratio"),
            Cell::new(&format!("{:.3}", self.sortino_ratio)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Closed Trades"),
            Cell::new(&format!("{}", self.num_trades)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Win Rate"),
            Cell::new(&format!("{:.2}%", self.win_rate * 100.0)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Avg Win"),
            Cell::new(&format!("${:.2}", self.avg_win)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Avg Loss"),
            Cell::new(&format!("${:.2}", self.avg_loss)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Largest Win"),
            Cell::new(&format!("${:.2}", self.largest_win)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Largest Loss"),
            Cell::new(&format!("${:.2}", self.largest_loss)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Profit Factor"),
            Cell::new(&format!("{:.3}", self.profit_factor)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Total Commission"),
            Cell::new(&format!("${:.2}", self.total_commission)),
        ]));

        table.add_row(Row::new(vec![
            Cell::new("Exposure"),
            Cell::new(&format!("{:.2}%", self.exposure * 100.0)),
        ]));

        table.printstd();
    }
}

struct TradeStats {
    num_trades: usize,
    num_winning_trades: usize,
    num_losing_trades: usize,
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    profit_factor: f64,
    largest_win: f64,
    largest_loss: f64,
}

fn calculate_trade_statistics(trades: &[TradeRecord]) -> TradeStats {
    if trades.is_empty() {
        return TradeStats {
            num_trades: 0,
            num_winning_trades: 0,
            num_losing_trades: 0,
            win_rate: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
        };
    }

    let winning: Vec<f64> = trades
        .iter()
        .map(|t| t.net_pnl)
        .filter(|&pnl| pnl > 0.0)
        .collect();
    let losing: Vec<f64> = trades
        .iter()
        .map(|t| t.net_pnl)
        .filter(|&pnl| pnl < 0.0)
        .collect();

    let num_winning = winning.len();
    let num_losing = losing.len();
    let total = trades.len();

    let win_rate = num_winning as f64 / total as f64;

    let avg_win = if num_winning > 0 {
        winning.iter().sum::<f64>() / num_winning as f64
    } else {
        0.0
    };

    let avg_loss = if num_losing > 0 {
        losing.iter().sum::<f64>() / num_losing as f64
    } else {
        0.0
    };

    let total_wins: f64 = winning.iter().sum();
    let total_losses: f64 = losing.iter().sum::<f64>().abs();

    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else if total_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    let largest_win = winning.iter().fold(0.0f64, |a, &b| a.max(b));
    let largest_loss = losing.iter().fold(0.0f64, |a, &b| a.min(b));

    TradeStats {
        num_trades: total,
        num_winning_trades: num_winning,
        num_losing_trades: num_losing,
        win_rate,
        avg_win,
        avg_loss,
        profit_factor,
        largest_win,
        largest_loss,
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 || std_dev.is_nan() {
        return 0.0;
    }

    //annualize assuming daily returns
    (mean / std_dev) * (252.0_f64).sqrt()
}

fn calculate_sortino_ratio(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let mean = returns.mean();

    //downside deviation uses only negative returns
    let negative_returns: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();

    if negative_returns.is_empty() {
        return if mean > 0.0 { f64::INFINITY } else { 0.0 };
    }

    let downside_dev = negative_returns.std_dev();

    if downside_dev == 0.0 || downside_dev.is_nan() {
        return 0.0;
    }

    //annualize
    (mean / downside_dev) * (252.0_f64).sqrt()
}

//share of equity-curve points falling inside a trade's entry/exit span
//round trips never overlap, so a single forward pass suffices
fn calculate_exposure(equity_curve: &[EquityPoint], trades: &[TradeRecord]) -> f64 {
    if equity_curve.is_empty() || trades.is_empty() {
        return 0.0;
    }

    let mut in_market_count = 0;
    let mut trade_idx = 0;

    for point in equity_curve {
        while trade_idx < trades.len() && trades[trade_idx].exit_time <= point.timestamp {
            trade_idx += 1;
        }

        if trade_idx < trades.len() && trades[trade_idx].entry_time <= point.timestamp {
            in_market_count += 1;
        }
    }

    in_market_count as f64 / equity_curve.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn trade(entry_day: u32, exit_day: u32, net_pnl: f64) -> TradeRecord {
        TradeRecord {
            entry_time: ts(entry_day),
            exit_time: ts(exit_day),
            peak_quantity: 100,
            average_entry_cost: 10.0,
            gross_pnl: net_pnl + 1.0,
            net_pnl,
            total_commission: 1.0,
            fill_count: 2,
        }
    }

    fn flat_curve(days: &[u32], equity: f64) -> Vec<EquityPoint> {
        days.iter()
            .map(|&d| EquityPoint::new(ts(d), equity, 0.0, 0.0))
            .collect()
    }

    #[test]
    fn trade_stats_split_wins_and_losses_on_net_pnl() {
        let trades = vec![trade(4, 5, 100.0), trade(6, 7, -40.0), trade(8, 9, 60.0)];
        let curve = flat_curve(&[4, 5, 6, 7, 8, 9], 100_000.0);

        let summary = SummaryMetrics::from_backtest(&curve, &trades, 100_000.0);

        assert_eq!(summary.num_trades, 3);
        assert_eq!(summary.num_winning_trades, 2);
        assert_eq!(summary.num_losing_trades, 1);
        assert!((summary.win_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((summary.avg_win - 80.0).abs() < 1e-9);
        assert!((summary.avg_loss + 40.0).abs() < 1e-9);
        assert!((summary.profit_factor - 4.0).abs() < 1e-9);
        assert!((summary.largest_win - 100.0).abs() < 1e-9);
        assert!((summary.largest_loss + 40.0).abs() < 1e-9);
        assert!((summary.total_commission - 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_run_yields_neutral_metrics() {
        let summary = SummaryMetrics::from_backtest(&[], &[], 100_000.0);
        assert_eq!(summary.final_value, 100_000.0);
        assert_eq!(summary.num_trades, 0);
        assert_eq!(summary.exposure, 0.0);
    }

    #[test]
    fn exposure_counts_bars_inside_trade_spans() {
        //one trade spanning days 5..7 out of days 4..=9
        let trades = vec![trade(5, 7, 10.0)];
        let curve = flat_curve(&[4, 5, 6, 7, 8, 9], 100_000.0);

        let summary = SummaryMetrics::from_backtest(&curve, &trades, 100_000.0);
        //in market on days 5 and 6
        assert!((summary.exposure - 2.0 / 6.0).abs() < 1e-9);
    }
}
