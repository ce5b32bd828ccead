use anyhow::Result;
use smc_trade_backtest::{load_candles_csv, run as run_backtest, BacktestConfig, BacktestReport};
use smc_trade_core::Timeframe;

pub fn run(data: &str, interval: &str, json: bool) -> Result<()> {
    let interval: Timeframe = interval.parse()?;
    let candles = load_candles_csv(data)?;

    let config = BacktestConfig {
        interval,
        ..BacktestConfig::default()
    };
    let report = run_backtest(&candles, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BacktestReport) {
    println!("=== Backtest Report ===");
    println!("Total trades:   {}", report.total_trades);
    println!(
        "Wins / losses:  {} / {} ({:.1}% win rate)",
        report.wins,
        report.losses,
        report.win_rate * 100.0
    );
    if report.profit_factor.is_infinite() {
        println!("Profit factor:  inf");
    } else {
        println!("Profit factor:  {:.2}", report.profit_factor);
    }
    println!("Expectancy:     {:.4}", report.expectancy);
    println!("Max drawdown:   {:.2}%", report.max_drawdown_pct);
    println!("Net PnL:        {:.4}", report.net_pnl);
    println!("Final balance:  {:.4}", report.final_balance);
}
