//! tunwire - obfuscated UDP echo/ping over a configured link

use std::path::PathBuf;

use tracing::info;

use tunwire::app::{init_logging, Runtime};
use tunwire::config::Config;
use tunwire::error::{Error, Result};

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        print_version();
        return Ok(());
    }

    if let Some(config_type) = args.gen_config {
        let config = match config_type.as_str() {
            "client" => Config::default_client(),
            "server" => Config::default_server(),
            _ => {
                eprintln!("Unknown config type: {}. Use 'client' or 'server'", config_type);
                std::process::exit(1);
            }
        };
        let json = serde_json::to_string_pretty(&config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    let path = match args.config {
        Some(path) => path,
        None => {
            print_help();
            std::process::exit(1);
        }
    };
    let config = Config::load(&path)?;

    init_logging(&config.log)?;
    info!("tunwire v{} starting...", env!("CARGO_PKG_VERSION"));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let runtime = Runtime::from_config(&config).await?;
        runtime.run().await
    })?;

    info!("Goodbye!");
    Ok(())
}

/// Command line arguments
struct Args {
    config: Option<PathBuf>,
    gen_config: Option<String>,
    version: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = None;
        let mut gen_config = None;
        let mut version = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-c" | "--config" => {
                    if i + 1 < args.len() {
                        config = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--gen-config" => {
                    if i + 1 < args.len() {
                        gen_config = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "-v" | "--version" => version = true,
                "-h" | "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') && config.is_none() => {
                    // Positional argument: treat as config file
                    config = Some(PathBuf::from(arg));
                }
                _ => {}
            }
            i += 1;
        }

        Self { config, gen_config, version }
    }
}

fn print_help() {
    println!(r#"tunwire - obfuscated UDP link

USAGE:
    tunwire [OPTIONS]

OPTIONS:
    -c, --config <FILE>     Path to configuration file
    --gen-config <TYPE>     Generate example config (client/server)
    -v, --version           Print version information
    -h, --help              Print help information

A server config echoes every packet back to its sender.
A client config sends each stdin line and prints the reply.

EXAMPLES:
    tunwire --gen-config server > server.json
    tunwire -c server.json
    echo hello | tunwire -c client.json
"#);
}

fn print_version() {
    println!("tunwire v{}", env!("CARGO_PKG_VERSION"));
}
