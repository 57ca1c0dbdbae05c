use std::io;
use std::net::IpAddr;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hoptrace::prompt::{prompt_options, PromptedOptions};
use hoptrace::{
    resolve_destination, ProbeProtocol, StubReverseResolver, Termination, TracerouteBuilder, TracerouteError,
    TracerouteTerminal,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(name = "hoptrace")]
#[command(bin_name = "hoptrace")]
struct TracerouteOptions {
    /// Destination host name or IPv4 address; asked for interactively when omitted
    #[arg(index = 1)]
    host: Option<String>,

    /// Wait for a probe no more than <WAIT>
    #[arg(short, long, value_parser = humantime::parse_duration, default_value = "1s")]
    wait: Duration,

    #[arg(short = 'P', long, value_enum, ignore_case = true, default_value = "icmp")]
    protocol: ProbeProtocol,

    /// Set the max number of hops (max TTL to be reached)
    #[arg(short, long, default_value_t = 30, value_parser = clap::value_parser!(u8).range(1..=255))]
    max_hops: u8,

    /// Do not resolve IP addresses to their domain names
    #[arg(short = 'n')]
    numeric: bool,

    /// Log probe activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn prompted_or_given(traceroute_options: &TracerouteOptions) -> Result<PromptedOptions, TracerouteError> {
    match &traceroute_options.host {
        Some(host) => Ok(PromptedOptions {
            host: host.clone(),
            max_wait_probe: traceroute_options.wait,
            protocol: traceroute_options.protocol,
        }),
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            prompt_options(&mut stdin.lock(), &mut stdout).map_err(TracerouteError::Output)
        },
    }
}

async fn run(traceroute_options: TracerouteOptions) -> Result<Termination, TracerouteError> {
    let PromptedOptions { host, max_wait_probe, protocol } = prompted_or_given(&traceroute_options)?;

    let ipv4_address = resolve_destination(&host).await?;
    println!("Tracing address: {host} {ipv4_address}");

    let target_ip_address = IpAddr::V4(ipv4_address);
    let active_dns_lookup = !traceroute_options.numeric;
    let reverse_resolver = StubReverseResolver::new();

    match protocol {
        ProbeProtocol::ICMP => {
            let traceroute = TracerouteBuilder::icmp()
                .target_ip_address(target_ip_address)
                .max_ttl(traceroute_options.max_hops)
                .max_wait_probe(max_wait_probe)
                .active_dns_lookup(active_dns_lookup)
                .build()?;
            TracerouteTerminal::new(traceroute, reverse_resolver).print_trace().await
        },
        ProbeProtocol::UDP => {
            let traceroute = TracerouteBuilder::udp()
                .target_ip_address(target_ip_address)
                .max_ttl(traceroute_options.max_hops)
                .max_wait_probe(max_wait_probe)
                .active_dns_lookup(active_dns_lookup)
                .build()?;
            TracerouteTerminal::new(traceroute, reverse_resolver).print_trace().await
        },
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let traceroute_options = TracerouteOptions::parse();
    init_logging(traceroute_options.verbose);

    match run(traceroute_options).await {
        Ok(Termination::Reached) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        },
    }
}
