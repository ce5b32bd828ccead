pub mod backtest;
pub mod replay;

use anyhow::Result;
use smc_trade_core::ConfigLoader;

pub fn print_config(path: &str) -> Result<()> {
    let config = ConfigLoader::load(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
