use clap::{Arg, ArgAction, Command};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use adbmap::{
    config::ScanConfig,
    output::{OutputConfig, OutputFormat, OutputManager},
    protocol::adb_factory,
    scanner::NetworkMapper,
    utils::target_parser::{parse_target_list, TargetParser},
    TcpConnector,
};
use anyhow::Context;
use colored::*;
use tokio::net::TcpStream;

/// Upper bound on addresses a single CIDR target may expand to
const MAX_CIDR_ADDRESSES: u64 = 65536;

fn build_cli() -> Command {
    Command::new("adbmap")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Finds Android devices with ADB over TCP enabled")
        .arg(
            Arg::new("target")
                .value_name("TARGET")
                .help("Target to scan (IP, ip:port, hostname, or CIDR); comma separated lists allowed")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port for targets that do not name one [default: 5555]")
                .value_parser(clap::value_parser!(u16).range(1..)),
        )
        .arg(
            Arg::new("concurrency")
                .short('c')
                .long("concurrency")
                .value_name("N")
                .help("Maximum number of probes in flight")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("MS")
                .help("Connect timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("handshake-timeout")
                .long("handshake-timeout")
                .value_name("MS")
                .help("ADB handshake timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("config")
                .short('C')
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file (defaults to ~/.adbmap.toml if present)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FORMAT")
                .help("Output format: text, json, greppable")
                .default_value("text"),
        )
        .arg(
            Arg::new("output-file")
                .long("output-file")
                .value_name("FILE")
                .help("Write results to FILE instead of stdout")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn load_config(matches: &clap::ArgMatches) -> anyhow::Result<ScanConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ScanConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ScanConfig::load_default_config(),
    };

    if let Some(&port) = matches.get_one::<u16>("port") {
        config = config.with_port(port);
    }
    if let Some(&concurrency) = matches.get_one::<usize>("concurrency") {
        config = config.with_max_in_flight(concurrency);
    }
    if let Some(&timeout) = matches.get_one::<u64>("timeout") {
        config = config.with_connect_timeout(timeout);
    }
    if let Some(&timeout) = matches.get_one::<u64>("handshake-timeout") {
        config = config.with_handshake_timeout(timeout);
    }

    config.validate()?;
    Ok(config)
}

async fn run(matches: clap::ArgMatches) -> anyhow::Result<()> {
    let config = load_config(&matches)?;

    let format: OutputFormat = matches
        .get_one::<String>("output")
        .map(String::as_str)
        .unwrap_or("text")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let output_file = matches.get_one::<PathBuf>("output-file").cloned();

    let colored = format == OutputFormat::Text
        && output_file.is_none()
        && !matches.get_flag("no-color")
        && std::io::stdout().is_terminal();
    if !colored {
        colored::control::set_override(false);
    }

    let raw_targets: Vec<String> = matches
        .get_many::<String>("target")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();

    let parser = TargetParser::new(config.port, MAX_CIDR_ADDRESSES, true);
    let targets = parse_target_list(&raw_targets, &parser)?;
    log::info!("Resolved {} target addresses", targets.len());

    let mapper = NetworkMapper::with_config(
        TcpConnector::new(config.connect_timeout_duration()),
        adb_factory::<TcpStream>(config.handshake_timeout_duration()),
        &config,
    );
    let report = mapper.scan_report(targets).await?;

    let output = OutputManager::new(OutputConfig {
        format,
        file: output_file,
        colored,
    });
    output.write_report(&report).context("writing scan results")?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_count("verbose"));

    if let Err(e) = run(matches).await {
        eprintln!("{} {:#}", "[!] Error:".bright_red().bold(), e);
        process::exit(1);
    }
}
