//! `spinlog targets`: list playable games.

use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Catalog, Config, GameTarget, Provider};

#[derive(Debug, Serialize)]
pub struct TargetOutput {
    pub name: String,
    pub provider: Provider,
    pub address: String,
}

impl From<GameTarget> for TargetOutput {
    fn from(target: GameTarget) -> Self {
        Self {
            name: target.name,
            provider: target.provider,
            address: target.address,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TargetListOutput {
    pub targets: Vec<TargetOutput>,
}

impl CommandOutput for TargetListOutput {
    fn to_human(&self) -> String {
        let targets: Vec<GameTarget> = self
            .targets
            .iter()
            .map(|t| GameTarget {
                name: t.name.clone(),
                provider: t.provider,
                address: t.address.clone(),
            })
            .collect();
        TableFormatter::new().format_targets(&targets)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Every catalog entry with its resolved address.
pub fn list_targets(config: &Config) -> Result<Vec<GameTarget>> {
    let catalog = Catalog::new(config.catalog.aristocrat.clone());
    catalog
        .entries()
        .into_iter()
        .map(|(provider, name)| catalog.resolve(&name, provider).map_err(Into::into))
        .collect()
}

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let targets = list_targets(config)?;
    let result = TargetListOutput {
        targets: targets.into_iter().map(TargetOutput::from).collect(),
    };
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_builtin_and_configured_games() {
        let mut config = Config::default();
        config
            .catalog
            .aristocrat
            .insert("buffalo".to_string(), "https://casino.example/buffalo".to_string());

        let targets = list_targets(&config).unwrap();
        assert_eq!(targets.len(), 9);
        assert!(targets
            .iter()
            .any(|t| t.name == "buffalo" && t.provider == Provider::Aristocrat));
        assert!(targets
            .iter()
            .filter(|t| t.provider == Provider::Igt)
            .all(|t| t.address.starts_with("https://m.ac.rgsgames.com/")));
    }

    #[test]
    fn test_json_output_shape() {
        let result = TargetListOutput {
            targets: list_targets(&Config::default())
                .unwrap()
                .into_iter()
                .map(TargetOutput::from)
                .collect(),
        };
        let json = result.to_json();
        assert_eq!(json["targets"][0]["provider"], "igt");
        assert_eq!(json["targets"][0]["name"], "wolf_run");
    }
}
