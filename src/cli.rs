//! Command-line and layered configuration for the `protoscan` binary.
//!
//! Values are merged from defaults, a `.protoscan.toml` dotfile,
//! `PROTOSCAN_*` environment variables and command-line arguments, with later
//! sources winning. The target may be given positionally
//! (`protoscan db:3306`) or with `--target`.

#![expect(
    non_snake_case,
    reason = "Clap/OrthoConfig derive macros generate helper modules with uppercase names"
)]
#![allow(
    missing_docs,
    reason = "OrthoConfig and Clap derive macros generate items that cannot be documented"
)]
#![allow(
    unfulfilled_lint_expectations,
    reason = "derive macros conditionally generate items"
)]

use std::ffi::OsString;

use anyhow::{Result, anyhow};
use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, parser::ValueSource};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::{logging::DEFAULT_LOG_LEVEL, probe::ProbeOptions, timeout::Timeout};

/// Target scanned when none is configured.
pub const DEFAULT_TARGET: &str = "localhost:3306";

/// Runtime configuration for a scan.
#[derive(Args, OrthoConfig, Serialize, Deserialize, Default, Debug, Clone)]
#[ortho_config(prefix = "PROTOSCAN_")]
pub struct AppConfig {
    /// Target host and port to scan.
    #[ortho_config(default = DEFAULT_TARGET.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_TARGET))]
    pub target: String,
    /// Maximum time to wait for a connection to be made, e.g. `10s`.
    /// `0` waits indefinitely.
    #[ortho_config(default = Timeout::from_secs(10))]
    #[arg(long, default_value_t = Timeout::from_secs(10))]
    pub init_timeout: Timeout,
    /// Maximum time to wait for the server to respond once connected, e.g.
    /// `500ms`. `0` waits indefinitely.
    #[ortho_config(default = Timeout::from_secs(5))]
    #[arg(long, default_value_t = Timeout::from_secs(5))]
    pub read_timeout: Timeout,
    /// Log verbosity when `RUST_LOG` is unset.
    #[ortho_config(default = DEFAULT_LOG_LEVEL.to_owned())]
    #[arg(long, default_value_t = String::from(DEFAULT_LOG_LEVEL))]
    pub log_level: String,
    /// Print the report on a single line.
    #[ortho_config(default = false)]
    #[arg(long)]
    pub compact: bool,
}

impl AppConfig {
    /// Deadlines for [`crate::probe::probe`].
    #[must_use]
    pub const fn probe_options(&self) -> ProbeOptions {
        ProbeOptions {
            connect_timeout: self.init_timeout.deadline(),
            read_timeout: self.read_timeout.deadline(),
        }
    }
}

/// Top-level command line.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "protoscan",
    version,
    about = "Report the initial handshake of a MySQL-protocol server"
)]
pub struct Cli {
    /// Target host and port to scan.
    #[arg(value_name = "TARGET", conflicts_with = "target")]
    pub scan_target: Option<String>,
    /// Application configuration.
    #[command(flatten)]
    pub config: AppConfig,
}

impl Cli {
    /// Parse `args` and lay the values given on the command line over the
    /// dotfile, environment and defaults.
    ///
    /// # Errors
    /// Returns a [`clap::Error`] for usage problems (`--help` and `--version`
    /// included) and a configuration error when the dotfile or environment
    /// cannot be read.
    pub fn load_from_iter<I, T>(args: I) -> Result<AppConfig>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let matches = Self::command().try_get_matches_from(&args)?;
        let cli = Self::from_arg_matches(&matches)?;
        let program = args
            .first()
            .cloned()
            .unwrap_or_else(|| OsString::from("protoscan"));
        let layered = AppConfig::load_from_iter([program])
            .map_err(|err| anyhow!("failed to load configuration: {err}"))?;
        Ok(cli.overlay(&matches, layered))
    }

    fn overlay(self, matches: &ArgMatches, mut config: AppConfig) -> AppConfig {
        let given = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);
        let Self {
            scan_target,
            config: flags,
        } = self;
        if let Some(target) = scan_target {
            config.target = target;
        } else if given("target") {
            config.target = flags.target;
        }
        if given("init_timeout") {
            config.init_timeout = flags.init_timeout;
        }
        if given("read_timeout") {
            config.read_timeout = flags.read_timeout;
        }
        if given("log_level") {
            config.log_level = flags.log_level;
        }
        if given("compact") {
            config.compact = flags.compact;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use figment::Jail;
    use rstest::rstest;

    use super::*;

    #[test]
    fn command_definition_is_consistent() { Cli::command().debug_assert(); }

    #[rstest]
    fn defaults() {
        Jail::expect_with(|_j| {
            let cfg = Cli::load_from_iter(["protoscan"]).expect("load");
            assert_eq!(cfg.target, "localhost:3306");
            assert_eq!(cfg.init_timeout, Timeout::from_secs(10));
            assert_eq!(cfg.read_timeout, Timeout::from_secs(5));
            assert_eq!(cfg.log_level, "warn");
            assert!(!cfg.compact);
            Ok(())
        });
    }

    #[rstest]
    #[case(&["protoscan", "db.internal:3307"])]
    #[case(&["protoscan", "--target", "db.internal:3307"])]
    fn accepts_positional_or_flag_target(#[case] args: &[&str]) {
        Jail::expect_with(|_j| {
            let cfg = Cli::load_from_iter(args.iter().copied()).expect("load");
            assert_eq!(cfg.target, "db.internal:3307");
            Ok(())
        });
    }

    #[test]
    fn rejects_positional_and_flag_target_together() {
        let err = Cli::load_from_iter(["protoscan", "a:1", "--target", "b:2"])
            .expect_err("conflicting targets");
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }

    #[rstest]
    fn env_config_loading() {
        Jail::expect_with(|j| {
            j.set_env("PROTOSCAN_TARGET", "db.internal:3307");
            j.set_env("PROTOSCAN_READ_TIMEOUT", "750ms");
            let cfg = Cli::load_from_iter(["protoscan"]).expect("load");
            assert_eq!(cfg.target, "db.internal:3307");
            assert_eq!(cfg.read_timeout, Timeout::new(Duration::from_millis(750)));
            Ok(())
        });
    }

    #[rstest]
    fn cli_overrides_env() {
        Jail::expect_with(|j| {
            j.set_env("PROTOSCAN_TARGET", "db.internal:3307");
            j.set_env("PROTOSCAN_INIT_TIMEOUT", "30s");
            let cfg = Cli::load_from_iter(["protoscan", "10.0.0.5:3306", "--init-timeout", "2s"])
                .expect("load");
            assert_eq!(cfg.target, "10.0.0.5:3306");
            assert_eq!(cfg.init_timeout, Timeout::from_secs(2));
            Ok(())
        });
    }

    #[rstest]
    fn env_survives_unrelated_flags() {
        Jail::expect_with(|j| {
            j.set_env("PROTOSCAN_TARGET", "db.internal:3307");
            let cfg = Cli::load_from_iter(["protoscan", "--compact"]).expect("load");
            assert_eq!(cfg.target, "db.internal:3307");
            assert!(cfg.compact);
            Ok(())
        });
    }

    #[rstest]
    fn loads_from_dotfile() {
        Jail::expect_with(|j| {
            j.create_file(".protoscan.toml", "init_timeout = \"3s\"")?;
            let cfg = Cli::load_from_iter(["protoscan"]).expect("load");
            assert_eq!(cfg.init_timeout, Timeout::from_secs(3));
            Ok(())
        });
    }

    #[test]
    fn rejects_malformed_duration_flag() {
        let err = Cli::load_from_iter(["protoscan", "--read-timeout", "soon"])
            .expect_err("bad duration");
        assert!(err.downcast_ref::<clap::Error>().is_some());
    }

    #[rstest]
    #[case("10s", "5s", Some(Duration::from_secs(10)), Some(Duration::from_secs(5)))]
    #[case("0", "5s", None, Some(Duration::from_secs(5)))]
    #[case("1s", "0", Some(Duration::from_secs(1)), None)]
    #[case("1s", "250ms", Some(Duration::from_secs(1)), Some(Duration::from_millis(250)))]
    fn zero_means_no_deadline(
        #[case] init_timeout: &str,
        #[case] read_timeout: &str,
        #[case] connect: Option<Duration>,
        #[case] read: Option<Duration>,
    ) {
        let cfg = AppConfig {
            init_timeout: init_timeout.parse().expect("init timeout"),
            read_timeout: read_timeout.parse().expect("read timeout"),
            ..AppConfig::default()
        };
        let options = cfg.probe_options();
        assert_eq!(options.connect_timeout, connect);
        assert_eq!(options.read_timeout, read);
    }
}
