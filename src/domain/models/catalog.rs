//! Game catalog: maps a game name and provider to a playable address.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::errors::{SessionError, SessionResult};

/// Remote game server hosting IGT titles.
const IGT_ENTRY_POINT: &str = "https://m.ac.rgsgames.com/games/index.html";

/// Built-in IGT titles: (name, software id, skin code, NS code).
///
/// The skin code selects the graphics bundle, the NS code the hosting
/// e-betting client (GNUG = Golden Nugget, AMYA = Amaya).
const IGT_GAMES: &[(&str, &str, &str, &str)] = &[
    ("wolf_run", "200-1196-012", "CSRS", "AMYA"),
    ("lil_lady", "200-1190-011", "GNT1", "GNUG"),
    ("siberian_storm", "200-1150-003", "GNT2", "GNUG"),
    ("davinci_diamonds", "200-1100-011", "GNT2", "GNUG"),
    ("cleopatra", "200-1173-001", "GNT2", "GNUG"),
    ("double_diamond", "200-1219-001", "GNT2", "GNUG"),
    ("triple_diamond", "200-1221-001", "GNT2", "GNUG"),
    ("red_hot", "200-1303-002", "CSR1", "AMYA"),
];

/// Game provider, which also fixes how a session observes the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Driven through on-page controls and their visibility.
    Igt,
    /// Driven through the game engine's script state, behind an iframe.
    Aristocrat,
}

impl Provider {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Igt => "igt",
            Self::Aristocrat => "aristocrat",
        }
    }

    /// Whether the catalog address is an outer page embedding the game frame.
    pub const fn embeds_frame(&self) -> bool {
        matches!(self, Self::Aristocrat)
    }

    /// Whether the free-round inner loop runs unless configured otherwise.
    pub const fn free_rounds_by_default(&self) -> bool {
        matches!(self, Self::Aristocrat)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "igt" => Ok(Self::Igt),
            "aristocrat" => Ok(Self::Aristocrat),
            other => Err(format!("unknown provider '{other}' (expected igt or aristocrat)")),
        }
    }
}

/// A resolved, playable game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTarget {
    pub name: String,
    pub provider: Provider,
    pub address: String,
}

/// Lookup table of known games.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    aristocrat: BTreeMap<String, String>,
}

impl Catalog {
    /// Catalog with the built-in IGT titles and the given Aristocrat pages.
    pub const fn new(aristocrat: BTreeMap<String, String>) -> Self {
        Self { aristocrat }
    }

    /// Resolve a game name for a provider into a fully-formed address.
    pub fn resolve(&self, name: &str, provider: Provider) -> SessionResult<GameTarget> {
        let unknown = || SessionError::UnknownTarget {
            name: name.to_string(),
            provider,
        };

        let address = match provider {
            Provider::Igt => {
                let (_, software_id, skin_code, ns_code) = IGT_GAMES
                    .iter()
                    .find(|(game, ..)| *game == name)
                    .ok_or_else(unknown)?;
                igt_address(software_id, skin_code, ns_code)?
            }
            Provider::Aristocrat => self.aristocrat.get(name).cloned().ok_or_else(unknown)?,
        };

        Ok(GameTarget {
            name: name.to_string(),
            provider,
            address,
        })
    }

    /// Every known game, IGT titles first.
    pub fn entries(&self) -> Vec<(Provider, String)> {
        IGT_GAMES
            .iter()
            .map(|(name, ..)| (Provider::Igt, (*name).to_string()))
            .chain(
                self.aristocrat
                    .keys()
                    .map(|name| (Provider::Aristocrat, name.clone())),
            )
            .collect()
    }
}

fn igt_address(software_id: &str, skin_code: &str, ns_code: &str) -> SessionResult<String> {
    let query = [
        ("currencycode", "FPY"),
        ("securetoken", "999999"),
        ("countrycode", "CA"),
        ("language", "en"),
        ("softwareid", software_id),
        ("skincode", skin_code),
        ("nscode", ns_code),
    ];
    let mut url = Url::parse(IGT_ENTRY_POINT)
        .map_err(|err| SessionError::Resolution(format!("invalid entry point: {err}")))?;
    url.query_pairs_mut().extend_pairs(query);
    Ok(url.to_string())
}
