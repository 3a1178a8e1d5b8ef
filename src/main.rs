use clap::{Parser, Subcommand, ValueEnum};
use cyberwatch::{
    Config, Server,
    client::{
        ClientTransport, Dashboard, ReconnectPolicy, WsConnector, api,
        endpoint::endpoint_for_origin,
    },
    config::DEFAULT_PORT,
    logging,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// CyberWatch - synthetic security telemetry over WebSocket
#[derive(Parser)]
#[command(name = "cyberwatch")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the telemetry server
    Serve {
        /// Bind address (overrides CYBERWATCH_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides CYBERWATCH_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Start with attack mode on
        #[arg(long)]
        attack_mode: bool,
    },

    /// Follow the event stream in the terminal
    Watch {
        /// Origin the dashboard is served from
        #[arg(long, default_value = "http://localhost")]
        origin: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Consecutive failures before switching to simulation
        #[arg(long, default_value_t = 5)]
        max_attempts: u32,

        /// Base reconnect delay, multiplied by the attempt number
        #[arg(long, default_value_t = 1000)]
        retry_base_ms: u64,
    },

    /// Print the server status
    Status {
        #[arg(long, default_value = "http://localhost:3000")]
        url: String,
    },

    /// Turn attack mode on or off
    Mode {
        state: Toggle,

        #[arg(long, default_value = "http://localhost:3000")]
        url: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    logging::init(config.log_format);

    match cli.command {
        Commands::Serve { host, port, attack_mode } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            config.attack_mode |= attack_mode;

            Server::new(config).run().await?;
        }
        Commands::Watch {
            origin,
            port,
            max_attempts,
            retry_base_ms,
        } => {
            let endpoint = endpoint_for_origin(&origin, port)?;
            let policy = ReconnectPolicy {
                max_attempts: max_attempts.max(1),
                base_delay: Duration::from_millis(retry_base_ms),
            };
            watch(endpoint, policy).await;
            // The blocking stdin read would otherwise hold up runtime shutdown.
            std::process::exit(0);
        }
        Commands::Status { url } => {
            let report = api::fetch_status(&url).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Mode { state, url } => {
            let enabled = matches!(state, Toggle::On);
            let now = api::set_remote_attack_mode(&url, enabled).await?;
            println!("attack mode {}", if now { "on" } else { "off" });
        }
    }

    Ok(())
}

/// Runs the client until `quit`, end of input or ctrl-c. Reads `on`, `off`
/// and `reconnect` from stdin.
async fn watch(endpoint: String, policy: ReconnectPolicy) {
    info!(%endpoint, "Watching");
    let (transport, handle) =
        ClientTransport::new(WsConnector::default(), endpoint, policy, Dashboard::new(true));
    let driver = tokio::spawn(transport.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match line.trim() {
                    "on" => { handle.set_attack_mode(true); }
                    "off" => { handle.set_attack_mode(false); }
                    "reconnect" => { handle.reconnect(); }
                    "status" => println!("* {}", handle.state()),
                    "quit" | "exit" => break,
                    "" => {}
                    other => {
                        println!("* unknown command {other:?} (on, off, reconnect, status, quit)");
                    }
                },
                _ => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.disconnect();
    if let Ok(dashboard) = driver.await {
        let attackers = dashboard.attacker_count();
        let countries = dashboard.countries().len();
        info!(attackers, countries, "Session ended");
    }
}
