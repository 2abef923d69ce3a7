use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::*;
use netsweep::{
    campaign::{CampaignDriver, CampaignMode, FULL_SWEEP_BASE},
    config::SweepConfig,
    network::{HostRange, Subnet},
    output::{console, ConsoleReporter, NotificationManager},
    probe::ProbeBackend,
    scanner::SweepEngine,
};
use tokio_util::sync::CancellationToken;

// Ulimit adjustment for Unix systems
#[cfg(unix)]
fn adjust_ulimit_size(ulimit: Option<u64>) -> u64 {
    use rlimit::Resource;

    if let Some(limit) = ulimit {
        match Resource::NOFILE.set(limit, limit) {
            Ok(()) => log::info!("Raised open file limit to {}", limit),
            Err(e) => eprintln!("{} {}", "[!] Failed to set ulimit value:".bright_red(), e),
        }
    }

    match Resource::NOFILE.get() {
        Ok((soft, _)) => soft,
        Err(e) => {
            log::warn!("Could not read file descriptor limit: {}", e);
            65535
        }
    }
}

#[cfg(not(unix))]
fn adjust_ulimit_size(_ulimit: Option<u64>) -> u64 {
    65535
}

fn print_banner() {
    println!("{}", "netsweep".bright_cyan().bold());
    println!("{}", "parallel ICMP host discovery for private networks".bright_blue());
    println!("{}", "--------------------------------------------------".bright_blue());
}

fn build_cli() -> Command {
    Command::new("netsweep")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Parallel ICMP host discovery across private IPv4 /24 subnets")
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("Campaign to run")
                .value_parser(["common", "full", "single", "quick"])
                .default_value("common"),
        )
        .arg(
            Arg::new("subnet")
                .short('s')
                .long("subnet")
                .value_name("A.B.C")
                .help("Subnet for single mode (e.g. 192.168.50)"),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .value_name("N")
                .help("First host octet for single mode")
                .value_parser(clap::value_parser!(u8))
                .default_value("1"),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_name("N")
                .help("Last host octet for single mode")
                .value_parser(clap::value_parser!(u8))
                .default_value("254"),
        )
        .arg(
            Arg::new("base")
                .long("base")
                .value_name("A.B")
                .help("Base /16 for full mode (default 192.168)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("MS")
                .help("Per-probe timeout in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("host-concurrency")
                .long("host-concurrency")
                .value_name("N")
                .help("Probes in flight per subnet (default: CPU count x I/O multiplier)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("subnet-concurrency")
                .long("subnet-concurrency")
                .value_name("N")
                .help("Subnets swept at the same time")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("progress-every")
                .long("progress-every")
                .value_name("N")
                .help("Report host progress every N probed hosts")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("backend")
                .short('b')
                .long("backend")
                .value_name("BACKEND")
                .help("Probe implementation")
                .value_parser(["auto", "icmp", "system"]),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Load configuration from a TOML file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the final report as JSON")
                .action(ArgAction::SetTrue),
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
                .help("Show per-subnet progress lines")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ulimit")
                .short('u')
                .long("ulimit")
                .value_name("LIMIT")
                .help("Raise the open file limit to this value")
                .value_parser(clap::value_parser!(u64)),
        )
}

/// Config file (or `~/.netsweep.toml`) with command line overrides on top
fn load_config(matches: &ArgMatches) -> anyhow::Result<SweepConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SweepConfig::from_toml_file(path).with_context(|| format!("loading {}", path))?,
        None => SweepConfig::load_default_config(),
    };

    if let Some(&timeout) = matches.get_one::<u64>("timeout") {
        config = config.with_timeout(timeout);
    }
    if let Some(&limit) = matches.get_one::<usize>("host-concurrency") {
        config = config.with_host_concurrency(limit);
    }
    if let Some(&limit) = matches.get_one::<usize>("subnet-concurrency") {
        config = config.with_subnet_concurrency(limit);
    }
    if let Some(&interval) = matches.get_one::<usize>("progress-every") {
        config = config.with_progress_interval(interval);
    }
    if let Some(backend) = matches.get_one::<String>("backend") {
        config = config.with_backend(backend.parse::<ProbeBackend>()?);
    }

    config.validate()?;
    Ok(config)
}

fn parse_base(input: &str) -> anyhow::Result<[u8; 2]> {
    let parts: Vec<&str> = input.trim_end_matches('.').split('.').collect();
    if parts.len() != 2 {
        bail!("Invalid base '{}': expected two octets like 192.168", input);
    }
    let first = parts[0].parse::<u8>().with_context(|| format!("Invalid base '{}'", input))?;
    let second = parts[1].parse::<u8>().with_context(|| format!("Invalid base '{}'", input))?;
    Ok([first, second])
}

fn build_mode(matches: &ArgMatches) -> anyhow::Result<CampaignMode> {
    let mode = matches.get_one::<String>("mode").map(String::as_str).unwrap_or("common");

    let campaign = match mode {
        "full" => {
            let base = match matches.get_one::<String>("base") {
                Some(base) => parse_base(base)?,
                None => FULL_SWEEP_BASE,
            };
            CampaignMode::Full { base }
        }
        "single" => {
            let subnet: Subnet = matches
                .get_one::<String>("subnet")
                .context("--mode single requires --subnet")?
                .parse()?;
            let start = matches.get_one::<u8>("start").copied().unwrap_or(1);
            let end = matches.get_one::<u8>("end").copied().unwrap_or(254);
            CampaignMode::Single {
                subnet,
                range: HostRange::new(start, end)?,
            }
        }
        "quick" => CampaignMode::Quick,
        _ => CampaignMode::Common,
    };
    Ok(campaign)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();

    if matches.get_flag("no-color") {
        colored::control::set_override(false);
    }
    let json = matches.get_flag("json");

    // Everything is validated before a single probe is sent
    let config = load_config(&matches)?;
    let mode = build_mode(&matches)?;
    let probe = config.backend.build().context("initialising probe backend")?;

    let cancel = CancellationToken::new();
    let notifier = if json {
        NotificationManager::disabled()
    } else {
        NotificationManager::default()
    };
    let engine = SweepEngine::new(&config, probe)?
        .with_notifier(notifier)
        .with_cancellation(cancel.clone());

    let fd_limit = adjust_ulimit_size(matches.get_one::<u64>("ulimit").copied());
    let needed = engine.limits().max_in_flight() as u64;
    if fd_limit < needed {
        log::warn!(
            "Open file limit {} is below the {} probes that may be in flight; consider --ulimit",
            fd_limit,
            needed
        );
    }

    let reporter = if json {
        None
    } else {
        print_banner();
        Some(ConsoleReporter::new(matches.get_flag("verbose")).spawn(engine.notifier()))
    };

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "\n[!] Interrupted, finishing in-flight batches...".bright_yellow());
            interrupt.cancel();
        }
    });

    let driver = CampaignDriver::new(engine);
    let report = driver.run(&mode).await?;

    // Dropping the last sender lets the reporter drain and exit
    drop(driver);
    if let Some(reporter) = reporter {
        reporter.await.context("console reporter task failed")?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        console::print_summary(&report);
    }

    Ok(())
}
