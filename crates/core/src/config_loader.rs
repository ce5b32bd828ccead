use crate::config::EngineConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads engine configuration by merging the TOML file with
    /// `SMC_`-prefixed environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a field fails to
    /// parse.
    pub fn load(path: &str) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("SMC_"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_uses_env_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SMC_SYMBOL", "SOLUSDT");
            let config = ConfigLoader::load("does-not-exist.toml").expect("load");
            assert_eq!(config.symbol, "SOLUSDT");
            Ok(())
        });
    }

    #[test]
    fn load_merges_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "Engine.toml",
                r#"
                symbol = "BTCUSDT"
                interval = "15m"
                leverage = 10
                "#,
            )?;
            let config = ConfigLoader::load("Engine.toml").expect("load");
            assert_eq!(config.leverage, 10);
            assert_eq!(config.interval.label(), "15m");
            Ok(())
        });
    }
}
