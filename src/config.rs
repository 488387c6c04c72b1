//! Application-level configuration loading: scoring rule and package catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{dao::models::PackageKind, stats::ScoringRule};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SHUTTLE_CONFIG_PATH";

/// Team and tournament allowances granted by a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PackageQuotas {
    pub team_quota: u32,
    pub tournament_quota: u32,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    scoring: ScoringRule,
    free: PackageQuotas,
    team: PackageQuotas,
    tournament: PackageQuotas,
    pro: PackageQuotas,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        win_points = app_config.scoring.win_points,
                        loss_points = app_config.scoring.loss_points,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    pub fn scoring(&self) -> &ScoringRule {
        &self.scoring
    }

    /// Quotas granted when a user switches to `kind`.
    pub fn quotas_for(&self, kind: PackageKind) -> PackageQuotas {
        match kind {
            PackageKind::Free => self.free,
            PackageKind::TeamPackage => self.team,
            PackageKind::TournamentPackage => self.tournament,
            PackageKind::ProPackage => self.pro,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringRule::default(),
            free: PackageQuotas {
                team_quota: 1,
                tournament_quota: 1,
            },
            team: PackageQuotas {
                team_quota: 3,
                tournament_quota: 0,
            },
            tournament: PackageQuotas {
                team_quota: 0,
                tournament_quota: 2,
            },
            pro: PackageQuotas {
                team_quota: 5,
                tournament_quota: 5,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
/// Sections left out keep their defaults.
struct RawConfig {
    scoring: Option<ScoringRule>,
    #[serde(default)]
    packages: RawPackages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawPackages {
    free: Option<PackageQuotas>,
    team_package: Option<PackageQuotas>,
    tournament_package: Option<PackageQuotas>,
    pro_package: Option<PackageQuotas>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        let packages = value.packages;
        Self {
            scoring: value.scoring.unwrap_or(defaults.scoring),
            free: packages.free.unwrap_or(defaults.free),
            team: packages.team_package.unwrap_or(defaults.team),
            tournament: packages.tournament_package.unwrap_or(defaults.tournament),
            pro: packages.pro_package.unwrap_or(defaults.pro),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "scoring": { "win_points": 3, "loss_points": 1 },
                "packages": { "PRO_PACKAGE": { "team_quota": 9, "tournament_quota": 8 } }
            }"#,
        )
        .unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.scoring().win_points, 3);
        assert_eq!(config.scoring().loss_points, 1);
        assert_eq!(
            config.quotas_for(PackageKind::ProPackage),
            PackageQuotas {
                team_quota: 9,
                tournament_quota: 8
            }
        );
        assert_eq!(config.quotas_for(PackageKind::TeamPackage).team_quota, 3);
    }

    #[test]
    fn default_catalog() {
        let config = AppConfig::default();
        assert_eq!(config.quotas_for(PackageKind::Free).team_quota, 1);
        assert_eq!(config.quotas_for(PackageKind::Free).tournament_quota, 1);
        assert_eq!(config.quotas_for(PackageKind::TournamentPackage).team_quota, 0);
        assert_eq!(*config.scoring(), ScoringRule::default());
    }
}
