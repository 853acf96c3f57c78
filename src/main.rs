use anyhow::{Context, Result};
use azurerm_pollers::azure::client::ArmClient;
use azurerm_pollers::azure::ids::{CustomDomainId, ResourceGroupId};
use azurerm_pollers::config::{self, Config};
use azurerm_pollers::pollers::cdn::{
    CdnCustomDomainDeletePoller, CdnCustomDomainWaitForApprovedPoller, APPROVAL_POLL_INTERVAL,
    DELETE_POLL_INTERVAL,
};
use azurerm_pollers::pollers::resource_group::{
    ResourceGroupCreatePoller, ResourceGroupPreventDeletePoller, POLL_INTERVAL,
};
use azurerm_pollers::pollers::{Poller, PollerType};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Wait for Azure Resource Manager operations that have no operation to poll
#[derive(Parser, Debug)]
#[command(name = "azurerm-pollers", version = azurerm_pollers::VERSION, about, long_about = None)]
struct Args {
    /// Azure subscription to use
    #[arg(short, long, global = true)]
    subscription: Option<String>,

    /// Give up after this many seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remember a subscription in the config file
    UseSubscription {
        subscription_id: String,
    },
    #[command(flatten)]
    Wait(WaitCommand),
}

#[derive(Subcommand, Debug)]
enum WaitCommand {
    /// Wait until a new resource group reads back consistently
    ResourceGroupCreated {
        resource_group: String,
    },
    /// Fail if a resource group still contains resources
    ResourceGroupEmpty {
        resource_group: String,
    },
    /// Wait until a deleted CDN custom domain is gone
    CdnDomainDeleted {
        resource_group: String,
        profile: String,
        domain: String,
    },
    /// Wait until a CDN custom domain's validation is approved
    CdnDomainApproved {
        resource_group: String,
        profile: String,
        domain: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("azurerm-pollers started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("azurerm-pollers").join("azurerm-pollers.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".azurerm-pollers").join("azurerm-pollers.log");
    }
    PathBuf::from("azurerm-pollers.log")
}

fn boxed<P: PollerType + 'static>(poller_type: P) -> Box<dyn PollerType> {
    Box::new(poller_type)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load().with_env();

    let command = match args.command {
        Command::UseSubscription { subscription_id } => {
            config.set_subscription(&subscription_id)?;
            println!("Using subscription {}", subscription_id);
            return Ok(());
        }
        Command::Wait(command) => command,
    };

    let subscription = config
        .effective_subscription(args.subscription.as_deref())
        .with_context(|| {
            format!(
                "No subscription configured. Set {} or use --subscription",
                config::ENV_SUBSCRIPTION_ID
            )
        })?;
    let client = ArmClient::new(&config.effective_endpoint(), &config::access_token()?)?;
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.polling.timeout());

    tracing::info!("Using subscription: {}", subscription);

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let (description, poller_type, interval): (String, Box<dyn PollerType>, Duration) =
        match command {
            WaitCommand::ResourceGroupCreated { resource_group } => {
                let id = ResourceGroupId::new(&subscription, resource_group);
                (
                    format!("waiting for {} to become available", id),
                    boxed(ResourceGroupCreatePoller::new(client, id)),
                    POLL_INTERVAL,
                )
            }
            WaitCommand::ResourceGroupEmpty { resource_group } => {
                let id = ResourceGroupId::new(&subscription, resource_group);
                if !config
                    .features
                    .resource_group
                    .prevent_deletion_if_contains_resources
                {
                    tracing::info!(
                        "prevent_deletion_if_contains_resources is disabled, not checking {}",
                        id
                    );
                    println!("Skipped: nested resource check is disabled for {}", id);
                    return Ok(());
                }
                (
                    format!("checking {} for nested resources", id),
                    boxed(ResourceGroupPreventDeletePoller::new(client, id)),
                    POLL_INTERVAL,
                )
            }
            WaitCommand::CdnDomainDeleted {
                resource_group,
                profile,
                domain,
            } => {
                let id = CustomDomainId::new(&subscription, resource_group, profile, domain);
                (
                    format!("waiting for {} to be deleted", id),
                    boxed(CdnCustomDomainDeletePoller::new(client, id)),
                    DELETE_POLL_INTERVAL,
                )
            }
            WaitCommand::CdnDomainApproved {
                resource_group,
                profile,
                domain,
            } => {
                let id = CustomDomainId::new(&subscription, resource_group, profile, domain);
                (
                    format!("waiting for the validation of {} to be approved", id),
                    boxed(CdnCustomDomainWaitForApprovedPoller::new(client, id)),
                    APPROVAL_POLL_INTERVAL,
                )
            }
        };

    let mut poller = Poller::new(
        poller_type,
        interval,
        config.polling.dropped_connections_allowed,
    )
    .with_timeout(timeout);

    poller
        .poll_until_done(&cancel)
        .await
        .with_context(|| description.clone())?;

    println!("Done: {}", description);
    Ok(())
}
