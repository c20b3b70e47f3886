use std::{
    error::Error,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};
use netbuilder::{plan::NetworkPlan, CidrBlock};
use netbuilder_cli::OutputFormat;
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the plan file in the config directory, used if no explicit path is given.
const DEFAULT_PLAN_FILE: &str = "plan.toml";
/// Directory in the user config directory holding the default plan file.
const CONFIG_DIR_NAME: &str = "netplan";
/// Prefix of environment variables overriding plan file values.
const ENV_PREFIX: &str = "NETPLAN";

#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Enable debug logging. Does nothing if `--silent` is set.
    #[arg(short = 'd', long = "debug", default_value_t = false, global = true)]
    debug: bool,

    /// Disable all logs except error logs.
    #[arg(long = "silent", default_value_t = false, global = true)]
    silent: bool,

    /// The logging format to use.
    #[arg(long = "log-format", value_enum, default_value_t = LoggingFormat::Compact, global = true)]
    logging_format: LoggingFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the boundaries, netmask and size of a block. Host bits are discarded.
    Inspect {
        /// Output in json format.
        #[arg(long = "json")]
        json: bool,

        /// The block to inspect, in `address/prefix` notation.
        cidr: CidrBlock,
    },

    /// Split a block in a number of consecutive subnets.
    Split {
        /// The block to split, in `address/prefix` notation.
        cidr: CidrBlock,

        /// Amount of subnets to create.
        #[arg(short = 'n', long = "count")]
        count: usize,

        /// Prefix length of the subnets. If this is not set, the largest subnets which fit
        /// `count` times in the block are created.
        #[arg(short = 'p', long = "prefix")]
        prefix: Option<u8>,

        /// Output format.
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Allocate all subnets described in a plan file.
    Plan {
        /// Path to the plan file. Defaults to `plan.toml` in the `netplan` directory of the user
        /// config directory. Values in the file can be overridden with `NETPLAN_` prefixed
        /// environment variables, e.g. `NETPLAN_CIDR=10.1.0.0/16`. Zones are given as a comma
        /// separated list, e.g. `NETPLAN_ZONES=az1,az2`. Tiers can only be set in the file.
        #[arg(short = 'c', long = "config")]
        config: Option<PathBuf>,

        /// Output format.
        #[arg(short = 'f', long = "format", value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoggingFormat {
    Compact,
    Logfmt,
    /// Same as Logfmt but with color statically disabled
    Plain,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = if cli.silent {
        LevelFilter::ERROR
    } else if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env()?,
        )
        .with(
            (cli.logging_format == LoggingFormat::Compact).then(|| {
                tracing_subscriber::fmt::Layer::new()
                    .compact()
                    .with_writer(std::io::stderr)
            }),
        )
        .with((cli.logging_format == LoggingFormat::Logfmt).then(tracing_logfmt::layer))
        .with((cli.logging_format == LoggingFormat::Plain).then(|| {
            tracing_logfmt::builder()
                .with_ansi_color(false)
                .layer()
        }))
        .init();

    match cli.command {
        Command::Inspect { json, cidr } => netbuilder_cli::inspect(cidr, json),
        Command::Split {
            cidr,
            count,
            prefix,
            format,
        } => netbuilder_cli::split(cidr, count, prefix, format),
        Command::Plan { config, format } => {
            let path = match config {
                Some(path) => path,
                None => default_plan_path()?,
            };
            let plan = load_plan(&path)?;
            netbuilder_cli::run_plan(&plan, format)
        }
    }
}

/// Location of the plan file if none is given on the command line.
fn default_plan_path() -> Result<PathBuf, Box<dyn Error>> {
    let dir = dirs::config_dir().ok_or("could not determine the user config directory")?;
    Ok(dir.join(CONFIG_DIR_NAME).join(DEFAULT_PLAN_FILE))
}

/// Load a plan from a TOML file, with overrides from the environment.
fn load_plan(path: &Path) -> Result<NetworkPlan, Box<dyn Error>> {
    load_plan_with_env(path, None)
}

/// Load a plan from a TOML file, with overrides from the given variables, or from the process
/// environment if `env` is `None`.
fn load_plan_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
) -> Result<NetworkPlan, Box<dyn Error>> {
    debug!("Loading plan from {path:?}");

    let settings = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("zones")
                .source(env),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use clap::Parser;

    use super::{load_plan, load_plan_with_env, Cli, Command};

    fn write_plan(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("netplan-{}-{name}.toml", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_plan_file() {
        let path = write_plan(
            "valid",
            r#"
            cidr = "10.0.0.0/16"
            zones = ["az1", "az2", "az3"]

            [[tiers]]
            name = "public"
            prefix = 24

            [[tiers]]
            name = "private"
            per_zone = 2
            "#,
        );

        let plan = load_plan(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(plan.cidr.to_string(), "10.0.0.0/16");
        assert_eq!(plan.zones, vec!["az1", "az2", "az3"]);
        assert_eq!(plan.tiers.len(), 2);
        assert_eq!(plan.tiers[0].prefix, Some(24));
        assert_eq!(plan.tiers[1].per_zone, 2);
        assert_eq!(plan.allocate().unwrap().len(), 9);
    }

    #[test]
    fn environment_overrides_plan_file() {
        let path = write_plan(
            "env",
            r#"
            cidr = "10.0.0.0/16"
            zones = ["az1"]

            [[tiers]]
            name = "public"
            prefix = 24
            "#,
        );

        let env = config::Map::from([
            ("NETPLAN_CIDR".to_string(), "10.1.0.0/16".to_string()),
            ("NETPLAN_ZONES".to_string(), "az1,az2".to_string()),
            ("OTHER_CIDR".to_string(), "192.168.0.0/16".to_string()),
        ]);
        let plan = load_plan_with_env(&path, Some(env));
        fs::remove_file(&path).unwrap();
        let plan = plan.unwrap();

        assert_eq!(plan.cidr.to_string(), "10.1.0.0/16");
        assert_eq!(plan.zones, vec!["az1", "az2"]);
        assert_eq!(plan.tiers.len(), 1);
        let cidrs: Vec<_> = plan
            .allocate()
            .unwrap()
            .into_iter()
            .map(|a| a.cidr.to_string())
            .collect();
        assert_eq!(cidrs, vec!["10.1.0.0/24", "10.1.1.0/24"]);
    }

    #[test]
    fn load_invalid_plan_file() {
        let path = write_plan("invalid", "cidr = \"10.0.0.0\"\nzones = [\"az1\"]\n");

        let res = load_plan(&path);
        fs::remove_file(&path).unwrap();

        assert!(res.is_err());
    }

    #[test]
    fn missing_plan_file() {
        assert!(load_plan(&std::env::temp_dir().join("netplan-does-not-exist.toml")).is_err());
    }

    #[test]
    fn parse_arguments() {
        let cli = Cli::try_parse_from(["netplan", "split", "10.0.0.0/16", "-n", "4"]).unwrap();
        match cli.command {
            Command::Split {
                cidr,
                count,
                prefix,
                ..
            } => {
                assert_eq!(cidr.to_string(), "10.0.0.0/16");
                assert_eq!(count, 4);
                assert_eq!(prefix, None);
            }
            _ => panic!("expected split command"),
        }

        assert!(Cli::try_parse_from(["netplan", "inspect", "10.0.0.0/33"]).is_err());
        assert!(Cli::try_parse_from(["netplan", "inspect", "--json", "10.0.0.1/8"]).is_ok());
    }
}
