//! rust-fakedns: Fake-IP DNS resolution engine
//!
//! Command-line front end for configuration checks and one-shot queries.
//!
//! # Usage
//!
//! ```bash
//! # Validate a configuration file
//! ./rust-fakedns -c /path/to/config.json --check
//!
//! # Resolve a single query through the router
//! ./rust-fakedns --query example.com A
//!
//! # Resolve with a blocklisted domain so it gets a fake IP
//! ./rust-fakedns --proxy-domain example.com --query www.example.com
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use rust_fakedns::config::{default_config_with_env, load_config_with_env, ResolverConfig};
use rust_fakedns::store::MemoryStore;
use rust_fakedns::upstream::UdpExchange;
use rust_fakedns::QueryRouter;

/// Command-line arguments
struct Args {
    /// Configuration file path
    config_path: PathBuf,
    /// Generate default configuration
    generate_config: bool,
    /// Check configuration only
    check_config: bool,
    /// One-shot query: name and record type
    query: Option<(String, String)>,
    /// Domains seeded into the in-memory blocklist
    proxy_domains: Vec<String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1).peekable();
        let mut config_path = PathBuf::from("/etc/rust-fakedns/config.json");
        let mut generate_config = false;
        let mut check_config = false;
        let mut query = None;
        let mut proxy_domains = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    if let Some(path) = args.next() {
                        config_path = PathBuf::from(path);
                    }
                }
                "-g" | "--generate-config" => {
                    generate_config = true;
                }
                "--check" => {
                    check_config = true;
                }
                "-q" | "--query" => {
                    let Some(name) = args.next() else {
                        eprintln!("--query requires a domain name");
                        std::process::exit(1);
                    };
                    let rtype = args
                        .next_if(|next| !next.starts_with('-'))
                        .unwrap_or_else(|| "A".to_string());
                    query = Some((name, rtype));
                }
                "-b" | "--proxy-domain" => {
                    if let Some(domain) = args.next() {
                        proxy_domains.push(domain);
                    }
                }
                "-h" | "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "-v" | "--version" => {
                    println!("rust-fakedns v{}", rust_fakedns::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {arg}");
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        Self {
            config_path,
            generate_config,
            check_config,
            query,
            proxy_domains,
        }
    }

    /// A one-shot query may run without a configuration file; a check may not
    fn uses_builtin_defaults(&self) -> bool {
        self.query.is_some() && !self.check_config && !self.config_path.exists()
    }
}

fn print_help() {
    println!(
        r#"rust-fakedns v{}

Fake-IP DNS resolution engine for selective proxy routing.

USAGE:
    rust-fakedns [OPTIONS]

OPTIONS:
    -c, --config <PATH>          Configuration file path [default: /etc/rust-fakedns/config.json]
    -g, --generate-config        Generate default configuration and exit
    --check                      Check configuration and exit
    -q, --query <NAME> [TYPE]    Resolve one query and print the response [default type: A]
    -b, --proxy-domain <DOMAIN>  Add a domain to the in-memory blocklist (repeatable)
    -h, --help                   Print help information
    -v, --version                Print version information

ENVIRONMENT:
    RUST_FAKEDNS_NAMESERVERS     Override upstream nameservers (comma-separated ip:port)
    RUST_FAKEDNS_FAKE_IP_POOL    Override fake-IP pool (CIDR)
    RUST_FAKEDNS_LOG_LEVEL       Override log level (trace, debug, info, warn, error)

If the configuration file does not exist, --query runs on built-in defaults
(environment overrides still apply). --check always requires the file.
"#,
        rust_fakedns::VERSION
    );
}

/// Initialize logging
fn init_logging(config: &ResolverConfig) {
    let level = match config.log.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.log.target)
        .with_writer(std::io::stderr);

    if config.log.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Build a single-question recursive query
fn build_query(name: &str, rtype: &str) -> Result<Message> {
    let mut name = Name::from_str(name).with_context(|| format!("invalid domain name '{name}'"))?;
    name.set_fqdn(true);
    let rtype = RecordType::from_str(&rtype.to_uppercase())
        .with_context(|| format!("invalid record type '{rtype}'"))?;

    let mut message = Message::new();
    message.set_id(rand::random());
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(Query::query(name, rtype));
    Ok(message)
}

/// Resolve one query and print the response
async fn run_query(config: &ResolverConfig, args: &Args, name: &str, rtype: &str) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let blocklist_key = format!("{}:proxy-domains", config.key_prefix);
    for domain in &args.proxy_domains {
        store.sadd(&blocklist_key, domain.trim_end_matches('.'));
    }

    let router = QueryRouter::from_config(
        config,
        store,
        Arc::new(UdpExchange::new(config.upstream_timeout())),
    )?;

    let request = build_query(name, rtype)?;
    let started = Instant::now();
    let response = router
        .handle(&request)
        .await
        .context("query produced no response")?;

    println!(
        ";; rcode: {}, answers: {}, elapsed: {} ms",
        response.response_code(),
        response.answers().len(),
        started.elapsed().as_millis()
    );
    for record in response.answers() {
        println!("{record}");
    }

    let ip = response.answers().iter().find_map(|r| match r.data() {
        Some(hickory_proto::rr::RData::A(a)) => Some(a.0),
        _ => None,
    });
    if let Some(ip) = ip.filter(|ip| router.internal().is_fake_ip(*ip)) {
        if let Some(domain) = router.internal().lookup_domain(ip).await? {
            println!(";; fake IP {ip} maps to {domain}");
        }
    }

    Ok(())
}

/// Main application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle generate-config
    if args.generate_config {
        rust_fakedns::config::create_default_config(&args.config_path)?;
        println!("Generated default configuration at {:?}", args.config_path);
        return Ok(());
    }

    let config = if args.uses_builtin_defaults() {
        default_config_with_env().context("Invalid built-in configuration")?
    } else {
        load_config_with_env(&args.config_path).map_err(|e| {
            anyhow::anyhow!(
                "Failed to load configuration from {:?}: {}",
                args.config_path,
                e
            )
        })?
    };

    // Handle check-config
    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    init_logging(&config);

    info!("rust-fakedns v{}", rust_fakedns::VERSION);
    info!(
        "Fake-IP pool {}, nameservers {:?}",
        config.fake_ip_pool, config.nameservers
    );

    match &args.query {
        Some((name, rtype)) => run_query(&config, &args, name, rtype).await,
        None => {
            print_help();
            Ok(())
        }
    }
}
