use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration from a TOML file, with
    /// `STOCK_COUNCIL_`-prefixed environment variables layered on top.
    ///
    /// Every section has defaults, so a missing config file yields a
    /// fully usable configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("STOCK_COUNCIL_"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = ConfigLoader::load_from("does-not-exist.toml").unwrap();
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.analysis.roles.len(), 5);
        assert_eq!(cfg.backtest.execution_delay_days, 1);
    }
}
