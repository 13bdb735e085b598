//! serialconsole: attach the local terminal to a remote serial console.
//!
//! # Usage
//!
//! ```text
//! serialconsole --token <TOKEN> --connection-url <URL> [OPTIONS]
//! serialconsole --token <TOKEN> --subscription <ID> --resource-group <RG> --vm-name <VM> [OPTIONS]
//!
//! Options:
//!   --arm-endpoint        <URL>   Management endpoint [default: https://management.azure.com]
//!   --origin              <URL>   Origin header on the connect request
//!   --connect-timeout     <SECS>  Bound on one connection attempt [default: 30]
//!   --loading-interval-ms <MS>    Animation frame interval [default: 500]
//!   --log-file            <PATH>  Write logs to a file instead of stderr
//! ```
//!
//! # Keys
//!
//! | Keys         | Action                                   |
//! |--------------|------------------------------------------|
//! | `Ctrl+] n`   | send a non-maskable interrupt            |
//! | `Ctrl+] r`   | reset the device                         |
//! | `Ctrl+] s X` | SysRq with key `X`                       |
//! | `Ctrl+] q`   | quit                                     |
//! | `Ctrl+] Ctrl+]` | send a literal `Ctrl+]`               |
//! | `Enter`      | reconnect after the connection went away |
//!
//! # Environment variable overrides
//!
//! | Variable                        | Description                  |
//! |---------------------------------|------------------------------|
//! | `SERIALCONSOLE_CONNECTION_URL`  | Connect endpoint             |
//! | `SERIALCONSOLE_ACCESS_TOKEN`    | Bearer token                 |
//! | `RUST_LOG`                      | Log filter (default `warn`)  |

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use serialconsole::application::RawModeGuard;
use serialconsole::domain::config::DEFAULT_ORIGIN;
use serialconsole::domain::ConsoleConfig;
use serialconsole::infrastructure::stdin::spawn_input_reader;
use serialconsole::infrastructure::terminal::{platform_terminal, TERMINAL_ERROR_MESSAGE};
use serialconsole::infrastructure::{
    CrlfWriter, HttpAdminChannel, HttpNegotiator, SessionSupervisor, StdoutOutput,
};
use serialconsole_core::{arm_connect_url, VmIdentity, DEFAULT_ARM_ENDPOINT};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Interactive client for a remote serial console.
///
/// Press `Ctrl+]` followed by `q` to quit.
#[derive(Debug, Parser)]
#[command(
    name = "serialconsole",
    about = "Attach this terminal to a remote serial console",
    version
)]
struct Cli {
    /// Connect endpoint that returns the websocket URL.
    ///
    /// Takes precedence over the VM identity options.
    #[arg(long, env = "SERIALCONSOLE_CONNECTION_URL")]
    connection_url: Option<String>,

    /// Subscription id of the virtual machine.
    #[arg(long)]
    subscription: Option<String>,

    /// Resource group of the virtual machine.
    #[arg(long)]
    resource_group: Option<String>,

    /// Name of the virtual machine.
    #[arg(long)]
    vm_name: Option<String>,

    /// Management endpoint used to build the connect URL from a VM identity.
    #[arg(long, default_value = DEFAULT_ARM_ENDPOINT)]
    arm_endpoint: String,

    /// Bearer token for the serial console service.
    #[arg(long, env = "SERIALCONSOLE_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// `Origin` header sent with the connect request.
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Seconds one connection attempt may take before it counts as failed.
    #[arg(long, default_value_t = 30)]
    connect_timeout: u64,

    /// Frame interval of the loading animation in milliseconds.
    #[arg(long, default_value_t = 500)]
    loading_interval_ms: u64,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ConsoleConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if neither a connection URL nor a complete VM
    /// identity was given, if the token is empty, or if a duration is zero.
    fn into_console_config(self) -> anyhow::Result<ConsoleConfig> {
        let connection_url = match (
            self.connection_url,
            self.subscription,
            self.resource_group,
            self.vm_name,
        ) {
            (Some(url), ..) => url,
            (None, Some(subscription_id), Some(resource_group), Some(vm_name)) => {
                let vm = VmIdentity {
                    subscription_id,
                    resource_group,
                    vm_name,
                };
                arm_connect_url(&self.arm_endpoint, &vm)
            }
            _ => bail!(
                "either --connection-url or all of --subscription, --resource-group and --vm-name are required"
            ),
        };

        if self.token.trim().is_empty() {
            bail!("the access token must not be empty");
        }
        if self.connect_timeout == 0 {
            bail!("--connect-timeout must be at least 1 second");
        }
        if self.loading_interval_ms == 0 {
            bail!("--loading-interval-ms must be at least 1");
        }

        Ok(ConsoleConfig {
            connection_url,
            access_token: self.token,
            origin: Some(self.origin).filter(|o| !o.is_empty()),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            loading_interval: Duration::from_millis(self.loading_interval_ms),
        })
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Initialises `tracing`.
///
/// The terminal belongs to the remote console, so logs default to `warn` on
/// stderr, with `\r\n` line endings because raw mode is usually active
/// while they are written.  With `--log-file` they go to that file instead,
/// without ANSI colours.
fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(CrlfWriter::stderr)
                .init();
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and turned into a [`ConsoleConfig`].  Bad
///    combinations are reported here, while the terminal is still normal.
/// 2. The terminal is switched to raw mode.  If that fails (no TTY) the
///    process exits with an error.
/// 3. A thread starts reading stdin.
/// 4. The [`SessionSupervisor`] connects and runs until quit, stdin EOF or
///    Ctrl+C.
/// 5. The terminal is restored.  The guard's `Drop` covers panics and early
///    returns.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;
    let config = cli.into_console_config()?;
    info!(?config, "starting serial console");

    let negotiator =
        HttpNegotiator::new(&config).context("failed to initialise the connect client")?;
    let admin =
        HttpAdminChannel::new(&config).context("failed to initialise the admin command client")?;

    // ── Raw mode ──────────────────────────────────────────────────────────────
    let mut guard = match RawModeGuard::enter(platform_terminal()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{TERMINAL_ERROR_MESSAGE}");
            return Err(e).context("failed to configure the terminal");
        }
    };

    let input = spawn_input_reader(std::io::stdin()).context("failed to start the input reader")?;

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    let mut supervisor = SessionSupervisor::new(
        &config,
        Arc::new(negotiator),
        Arc::new(admin),
        Arc::new(StdoutOutput::new()),
    );
    let reason = supervisor.run(input, interrupt).await;

    guard.restore();
    info!(?reason, "serial console stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
