use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use quantlab::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "quantlab")]
#[command(about = "A Rust-based moving-average backtesting engine for daily equity data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run a backtest
    Run {
        //path to a json configuration file; overrides all other flags
        #[arg(long)]
        config: Option<PathBuf>,

        //path to csv data file
        #[arg(long)]
        data: Option<PathBuf>,

        //symbol to trade (eg aapl, msft)
        #[arg(long, default_value = "AAPL")]
        symbol: String,

        //strategy type (price_sma, sma_cross)
        #[arg(long, default_value = "price_sma")]
        strategy: String,

        //start of the date range (yyyy-mm-dd, inclusive)
        #[arg(long)]
        start: Option<NaiveDate>,

        //end of the date range (yyyy-mm-dd, inclusive)
        #[arg(long)]
        end: Option<NaiveDate>,

        //initial cash
        #[arg(long, default_value = "100000")]
        cash: f64,

        //commission rate per side, as a fraction of notional
        #[arg(long, default_value = "0.001")]
        commission: f64,

        //shares per entry order
        #[arg(long, default_value = "100")]
        stake: u32,

        //sma lookback period (for price_sma strategy)
        #[arg(long, default_value = "20")]
        ma_period: usize,

        //fast sma window (for sma_cross strategy)
        #[arg(long)]
        fast: Option<usize>,

        //slow sma window (for sma_cross strategy)
        #[arg(long)]
        slow: Option<usize>,

        //also export one csv row per fill
        #[arg(long)]
        export_fills: bool,

        //directory for result files
        #[arg(long, default_value = "results")]
        outdir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            strategy,
            start,
            end,
            cash,
            commission,
            stake,
            ma_period,
            fast,
            slow,
            export_fills,
            outdir,
        } => {
            let configuration = match config {
                Some(path) => BacktestConfiguration::from_json_file(&path)
                    .context(format!("Failed to load configuration from {:?}", path))?,
                None => {
                    let data_path =
                        data.ok_or_else(|| anyhow::anyhow!("--data is required without --config"))?;

                    let strategy_kind = StrategyKind::parse(&strategy)
                        .ok_or_else(|| anyhow::anyhow!("Unknown strategy: {}", strategy))?;

                    let strategy_params = match strategy_kind {
                        StrategyKind::PriceSmaCross => {
                            StrategyParams::PriceSma(PriceSmaParams { ma_period, stake })
                        }
                        StrategyKind::DualSmaCross => StrategyParams::DualSma(DualSmaParams {
                            fast_window: fast.unwrap_or(20),
                            slow_window: slow.unwrap_or(50),
                            stake,
                        }),
                    };

                    BacktestConfiguration {
                        data_path,
                        symbol,
                        start,
                        end,
                        initial_cash: cash,
                        commission_rate: commission,
                        strategy_kind,
                        strategy_params,
                        export_fills,
                        outdir,
                    }
                }
            };

            run_backtest(configuration)?;
        }
    }

    Ok(())
}

fn run_backtest(config: BacktestConfiguration) -> Result<()> {
    println!("Quantlab Backtesting Engine");
    println!("===========================\n");

    //load data
    println!("Loading data from {:?}...", config.data_path);
    let all_bars = load_csv(&config.data_path)
        .context(format!("Failed to load data from {:?}", config.data_path))?;

    //filter by symbol and date range
    let bars = filter_by_symbol(&all_bars, &config.symbol);
    let bars = filter_by_date_range(&bars, config.start, config.end);

    if bars.is_empty() {
        anyhow::bail!("No data found for symbol {}", config.symbol);
    }

    println!("Loaded {} bars for {}", bars.len(), config.symbol);
    println!(
        "Date range: {} to {}\n",
        bars.first().unwrap().timestamp.date(),
        bars.last().unwrap().timestamp.date()
    );

    //create strategy
    let (mut strategy, strategy_desc): (Box<dyn Strategy>, String) = match &config.strategy_params
    {
        StrategyParams::PriceSma(params) => (
            Box::new(PriceSmaCrossStrategy::new(params.ma_period, params.stake)),
            format!("Price-SMA Cross (SMA period = {})", params.ma_period),
        ),
        StrategyParams::DualSma(params) => (
            Box::new(DualSmaCrossStrategy::new(
                params.fast_window,
                params.slow_window,
                params.stake,
            )),
            format!(
                "Dual-SMA Crossover (fast = {}, slow = {})",
                params.fast_window, params.slow_window
            ),
        ),
    };

    println!("Strategy: {}", strategy_desc);
    println!("Initial cash: ${:.2}", config.initial_cash);
    println!(
        "Commission: {:.4}% of notional per side\n",
        config.commission_rate * 100.0
    );

    //create backtest config
    let engine_config = BacktestConfig {
        initial_cash: config.initial_cash,
        commission_rate: config.commission_rate,
        max_lookback: 500,
        record_fills: config.export_fills,
    };

    //run backtest
    println!("Running backtest...\n");
    let mut engine = BacktestEngine::new(engine_config, bars, config.symbol.clone());
    let result = engine
        .run(&mut strategy)
        .context("Backtest aborted: the trade ledger rejected a notification")?;

    //display results
    println!("Backtest Results");
    println!("================\n");
    result.summary.pretty_print_table();

    //save outputs
    std::fs::create_dir_all(&config.outdir)
        .context(format!("Failed to create output directory {:?}", config.outdir))?;

    let prefix = format!("{}_{}", config.strategy_kind.slug(), config.symbol);

    let trades_path = config.outdir.join(format!("{}_trades.csv", prefix));
    save_trades_csv(&result.trades, &trades_path)?;
    println!("\nTrades saved to {:?}", trades_path);

    let mut fills_path = None;
    if config.export_fills {
        let path = config.outdir.join(format!("{}_fills.csv", prefix));
        save_fills_csv(&result.fills, &path)?;
        println!("Fills saved to {:?}", path);
        fills_path = Some(path);
    }

    let equity_path = config.outdir.join(format!("{}_equity.csv", prefix));
    save_equity_csv(&result.equity_curve, &equity_path)?;
    println!("Equity curve saved to {:?}", equity_path);

    let summary_path = config.outdir.join("summary.txt");
    save_summary_txt(
        &config,
        &strategy_desc,
        &result.summary,
        &trades_path,
        fills_path.as_deref(),
        &equity_path,
        &summary_path,
    )?;
    println!("Summary saved to {:?}", summary_path);

    Ok(())
}

fn save_trades_csv(trades: &[TradeRecord], path: &Path) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(
        file,
        "entry_time,exit_time,peak_quantity,average_entry_cost,gross_pnl,net_pnl,total_commission,fill_count"
    )?;

    for trade in trades {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            trade.entry_time,
            trade.exit_time,
            trade.peak_quantity,
            trade.average_entry_cost,
            trade.gross_pnl,
            trade.net_pnl,
            trade.total_commission,
            trade.fill_count
        )?;
    }

    Ok(())
}

fn save_fills_csv(fills: &[FillRecord], path: &Path) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "timestamp,side,quantity,price,commission")?;

    for fill in fills {
        writeln!(
            file,
            "{},{:?},{},{},{}",
            fill.timestamp, fill.side, fill.quantity, fill.price, fill.commission
        )?;
    }

    Ok(())
}

fn save_equity_csv(equity_curve: &[EquityPoint], path: &Path) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;
    writeln!(file, "timestamp,equity,drawdown,returns")?;

    for point in equity_curve {
        writeln!(
            file,
            "{},{},{},{}",
            point.timestamp, point.equity, point.drawdown, point.returns
        )?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn save_summary_txt(
    config: &BacktestConfiguration,
    strategy_desc: &str,
    summary: &SummaryMetrics,
    trades_path: &Path,
    fills_path: Option<&Path>,
    equity_path: &Path,
    path: &Path,
) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(path)?;

    writeln!(file, "=== Backtest Results Summary ===")?;
    writeln!(
        file,
        "Generated at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(file, "Symbol: {}", config.symbol)?;
    writeln!(
        file,
        "Period: {} to {}",
        config
            .start
            .map(|d| d.to_string())
            .unwrap_or_else(|| "data start".to_string()),
        config
            .end
            .map(|d| d.to_string())
            .unwrap_or_else(|| "data end".to_string())
    )?;
    writeln!(file, "Strategy: {}", strategy_desc)?;

    writeln!(file, "\n--- Portfolio ---")?;
    writeln!(file, "Initial Cash: ${:.2}", summary.initial_cash)?;
    writeln!(file, "Final Value: ${:.2}", summary.final_value)?;
    writeln!(file, "Net P/L: ${:.2}", summary.net_pnl)?;
    writeln!(file, "Return: {:.2}%", summary.total_return_pct * 100.0)?;

    writeln!(file, "\n--- Trades ---")?;
    writeln!(file, "Total Closed Trades: {}", summary.num_trades)?;
    writeln!(file, "Wins: {}", summary.num_winning_trades)?;
    writeln!(file, "Losses: {}", summary.num_losing_trades)?;
    if summary.num_trades > 0 {
        writeln!(file, "Win Rate: {:.2}%", summary.win_rate * 100.0)?;
    } else {
        writeln!(file, "Win Rate: N/A (no closed trades)")?;
    }
    writeln!(file, "Total Commission: ${:.2}", summary.total_commission)?;

    writeln!(file, "\n--- Risk/Quality ---")?;
    writeln!(file, "Sharpe (annualized): {:.3}", summary.sharpe_ratio)?;
    writeln!(file, "Sortino (annualized): {:.3}", summary.sortino_ratio)?;
    writeln!(file, "Max Drawdown (%): {:.2}", summary.max_drawdown * 100.0)?;
    writeln!(file, "Exposure (%): {:.2}", summary.exposure * 100.0)?;

    writeln!(file, "\n--- Files ---")?;
    writeln!(file, "- Trades CSV: {}", trades_path.display())?;
    if let Some(fills) = fills_path {
        writeln!(file, "- Fills CSV: {}", fills.display())?;
    }
    writeln!(file, "- Equity CSV: {}", equity_path.display())?;
    writeln!(file, "- Summary: {}", path.display())?;

    Ok(())
}
