//! Configuration for the backend load test.
//!
//! `ENV` selects the backend deployment and `WORKLOAD` the virtual users
//! ramp of the loading scenario, both can be overridden from the CLI.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use url::Url;

/// Backend deployment under test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Staging,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Dev => "https://termmax-backend-v2-test.onrender.com",
            Self::Staging => "https://termmax-api.staging.ts.finance",
            Self::Testnet => "https://termmax-api.testnet.ts.finance",
            Self::Mainnet => "https://termmax-api.ts.finance",
        }
    }

    pub fn chain_ids(&self) -> &'static [u64] {
        match self {
            Self::Dev | Self::Staging | Self::Testnet => &[11155111, 421614],
            Self::Mainnet => &[1, 42161],
        }
    }
}

/// Ramp of the loading scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    Average,
    Stress,
    #[default]
    Smoke,
}

/// Virtual users target reached linearly over `duration`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    const fn minutes(minutes: u64, target: u32) -> Self {
        Self {
            duration: Duration::from_secs(minutes * 60),
            target,
        }
    }
}

impl Workload {
    pub fn stages(&self) -> Vec<Stage> {
        match self {
            Self::Average => vec![
                Stage::minutes(1, 100),
                Stage::minutes(4, 100),
                Stage::minutes(1, 0),
            ],
            Self::Stress => vec![
                Stage::minutes(1, 700),
                Stage::minutes(4, 700),
                Stage::minutes(1, 0),
            ],
            Self::Smoke => vec![Stage::minutes(1, 1)],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    Functional,
    Loading,
    #[default]
    All,
}

impl Scenario {
    pub fn functional(&self) -> bool {
        matches!(self, Self::Functional | Self::All)
    }

    pub fn loading(&self) -> bool {
        matches!(self, Self::Loading | Self::All)
    }
}

/// Environment configuration.
#[derive(Debug, Default, serde::Deserialize)]
pub struct EnvConfig {
    #[serde(default)]
    pub env: Environment,

    #[serde(default)]
    pub workload: Workload,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}

/// CLI arguments of the load test.
#[derive(Debug, Parser)]
#[command(name = "load_test")]
#[command(about = "Functional and load test of the TermMax backend")]
pub struct CliConfig {
    /// Scenarios to run
    #[arg(long, value_enum, default_value = "all")]
    pub scenario: Scenario,

    /// Backend deployment (overrides ENV)
    #[arg(long, value_enum)]
    pub env: Option<Environment>,

    /// Loading ramp (overrides WORKLOAD)
    #[arg(long, value_enum)]
    pub workload: Option<Workload>,

    /// Backend base URL (overrides the deployment URL)
    #[arg(long)]
    pub base_url: Option<Url>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    pub request_timeout: u64,
}

/// Resolved run settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub scenario: Scenario,
    pub base_url: Url,
    pub chain_ids: Vec<u64>,
    pub stages: Vec<Stage>,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn resolve(cli: CliConfig, env: EnvConfig) -> Result<Self, url::ParseError> {
        let environment = cli.env.unwrap_or(env.env);
        let workload = cli.workload.unwrap_or(env.workload);
        let base_url = match cli.base_url {
            Some(url) => url,
            None => Url::parse(environment.base_url())?,
        };
        Ok(Self {
            scenario: cli.scenario,
            base_url,
            chain_ids: environment.chain_ids().to_vec(),
            stages: workload.stages(),
            request_timeout: Duration::from_secs(cli.request_timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config() {
        let env: EnvConfig = envy::from_iter([
            ("ENV".to_string(), "mainnet".to_string()),
            ("WORKLOAD".to_string(), "stress".to_string()),
        ])
        .unwrap();
        assert_eq!(env.env, Environment::Mainnet);
        assert_eq!(env.workload, Workload::Stress);

        let env: EnvConfig = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(env.env, Environment::Dev);
        assert_eq!(env.workload, Workload::Smoke);
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = CliConfig::try_parse_from(["load_test", "--env", "testnet", "--scenario", "loading"])
            .unwrap();
        let settings = Settings::resolve(
            cli,
            EnvConfig {
                env: Environment::Mainnet,
                workload: Workload::Average,
            },
        )
        .unwrap();
        assert_eq!(settings.base_url.as_str(), "https://termmax-api.testnet.ts.finance/");
        assert_eq!(settings.chain_ids, vec![11155111, 421614]);
        assert_eq!(settings.stages.len(), 3);
        assert!(!settings.scenario.functional());
        assert!(settings.scenario.loading());
    }

    #[test]
    fn test_workload_stages() {
        let total: Duration = Workload::Average.stages().iter().map(|s| s.duration).sum();
        assert_eq!(total, Duration::from_secs(360));
        assert_eq!(Workload::Stress.stages()[1].target, 700);
        assert_eq!(Workload::Smoke.stages(), vec![Stage::minutes(1, 1)]);
    }
}
