//! Quarry Console - Entry Point
//!
//! Headless console agent for the Quarry storage platform. Mirrors the
//! dashboard's node lifecycle actions (list, create, deploy, watch) and can
//! run as a daemon keeping the inventory and deploy event log fresh.

use std::collections::HashMap;
use std::env;

use tokio::sync::mpsc;
use tracing::{error, info};

use quarry_console::app::options::AppOptions;
use quarry_console::app::run::run;
use quarry_console::app::state::AppState;
use quarry_console::events::stream::EventStream;
use quarry_console::logs::{init_logging, LogOptions};
use quarry_console::models::node::CreateNodeSpec;
use quarry_console::notify::Notification;
use quarry_console::storage::layout::StorageLayout;
use quarry_console::storage::settings::Settings;
use quarry_console::utils::version_info;
use quarry_console::workers::poller;

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut command: Option<String> = None;
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        } else if command.is_none() {
            command = Some(arg.clone());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version info: {}", e),
        }
        return;
    }

    // Retrieve the settings file; missing file falls back to defaults
    let layout = match cli_args.get("home") {
        Some(home) => StorageLayout::new(home),
        None => StorageLayout::default(),
    };
    let settings_file = layout.settings_file();
    let settings = if settings_file.exists().await {
        match settings_file.read_json::<Settings>().await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Settings::default()
    };

    if let Err(e) = settings.validate() {
        eprintln!("Invalid settings: {}", e);
        std::process::exit(1);
    }

    // Initialize logging
    let log_level = match cli_args.get("log-level") {
        Some(level) => match level.parse() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => settings.log_level.clone(),
    };
    if let Err(e) = init_logging(LogOptions {
        log_level,
        ..Default::default()
    }) {
        println!("Failed to initialize logging: {e}");
    }

    let options = AppOptions {
        cluster_base_url: settings.cluster.base_url.clone(),
        cluster_token: settings.cluster.token.clone(),
        salt_base_url: settings.salt.base_url.clone(),
        salt_username: settings.salt.username.clone(),
        storage: layout,
        enable_poller: settings.enable_poller,
        enable_watcher: settings.enable_watcher,
        poller: poller::Options {
            interval: std::time::Duration::from_secs(settings.polling_interval_secs),
            ..Default::default()
        },
        ..Default::default()
    };

    match command.as_deref().unwrap_or("run") {
        "run" => {
            info!("Running Quarry console daemon with options: {:?}", options);
            if let Err(e) = run(options, await_shutdown_signal()).await {
                error!("Failed to run the daemon: {e}");
                std::process::exit(1);
            }
        }
        "nodes" => cmd_list_nodes(&options).await,
        "create" => cmd_create_node(&options, &cli_args).await,
        "deploy" => cmd_deploy_node(&options, &cli_args).await,
        "watch" => cmd_watch_job(&options, &cli_args).await,
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: quarryctl [run|nodes|create|deploy|watch] [--key=value ...]");
            std::process::exit(2);
        }
    }
}

fn init_state(options: &AppOptions) -> (AppState, mpsc::UnboundedReceiver<Notification>) {
    match AppState::init(options) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    }
}

fn drain_notifications(notifications: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        println!("{}", notification.render());
    }
}

fn require_arg<'a>(cli_args: &'a HashMap<String, String>, key: &str) -> &'a str {
    match cli_args.get(key) {
        Some(value) => value,
        None => {
            eprintln!("Missing required argument: --{}=<value>", key);
            std::process::exit(2);
        }
    }
}

async fn cmd_list_nodes(options: &AppOptions) {
    let (state, _notifications) = init_state(options);

    if let Err(e) = state.flows.fetch_nodes().await {
        eprintln!("Failed to fetch nodes: {}", e);
        std::process::exit(1);
    }

    println!(
        "{:<20} {:<8} {:<16} {:<6} {:<12} {:<12}",
        "NAME", "READY", "ROLES", "CPU", "MEMORY", "VERSION"
    );
    for node in state.nodes.list().await {
        let mut roles = Vec::new();
        if node.bootstrap {
            roles.push("bootstrap");
        }
        if node.control_plane {
            roles.push("control-plane");
        }
        if node.workload_plane {
            roles.push("workload-plane");
        }

        println!(
            "{:<20} {:<8} {:<16} {:<6} {:<12} {:<12}",
            node.name,
            if node.is_ready() { "True" } else { "False" },
            roles.join(","),
            node.cpu.as_deref().unwrap_or("-"),
            node.memory.as_deref().unwrap_or("-"),
            node.version.as_deref().unwrap_or("-"),
        );
    }
}

async fn cmd_create_node(options: &AppOptions, cli_args: &HashMap<String, String>) {
    let spec = CreateNodeSpec {
        name: require_arg(cli_args, "name").to_string(),
        version: require_arg(cli_args, "node-version").to_string(),
        ssh_user: require_arg(cli_args, "ssh-user").to_string(),
        hostname_ip: require_arg(cli_args, "host").to_string(),
        ssh_port: cli_args.get("ssh-port").cloned().unwrap_or_else(|| "22".to_string()),
        ssh_key_path: require_arg(cli_args, "ssh-key").to_string(),
        sudo_required: cli_args.contains_key("sudo"),
        control_plane: cli_args.contains_key("control-plane"),
        workload_plane: cli_args.contains_key("workload-plane"),
    };

    let (state, mut notifications) = init_state(options);
    state.flows.create_node(&spec).await;
    drain_notifications(&mut notifications);

    if let Some(message) = state.nodes.create_error().await {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

async fn cmd_deploy_node(options: &AppOptions, cli_args: &HashMap<String, String>) {
    let name = require_arg(cli_args, "name").to_string();
    let version = require_arg(cli_args, "node-version").to_string();

    let (state, mut notifications) = init_state(options);
    let jid = state.flows.deploy_node(&name, &version).await;
    drain_notifications(&mut notifications);

    match jid {
        Some(jid) => {
            println!("Deployment of {} started, job id {}", name, jid);
            println!("Follow progress with: quarryctl watch --jid={}", jid);
        }
        None => std::process::exit(1),
    }
}

async fn cmd_watch_job(options: &AppOptions, cli_args: &HashMap<String, String>) {
    let (state, _notifications) = init_state(options);

    // Accept either an explicit jid or a node name tracked in the ledger
    let jid = match cli_args.get("jid") {
        Some(jid) => jid.clone(),
        None => {
            let name = require_arg(cli_args, "name");
            match state.ledger.jid_for_name(name).await {
                Ok(Some(jid)) => jid,
                Ok(None) => {
                    eprintln!("No tracked deployment for node {}", name);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Failed to read the job ledger: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let token = match state.session.token().await {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Failed to authenticate: {}", e);
            std::process::exit(1);
        }
    };

    let stream = match EventStream::connect(&state.salt_base_url, &token).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Failed to open the event stream: {}", e);
            std::process::exit(1);
        }
    };

    println!("Streaming deploy events for job {} (Ctrl+C to stop)...", jid);
    state.flows.subscribe_deploy_events(stream, &jid).await;

    let events = state.nodes.events_for(&jid).await;
    println!("Stream ended, {} event(s) received", events.len());
    for event in events {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to render event {}: {}", event.tag, e),
        }
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let sigterm = signal(SignalKind::terminate());
        let sigint = signal(SignalKind::interrupt());

        match (sigterm, sigint) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = sigint.recv() => {
                        info!("SIGINT received, shutting down...");
                    }
                }
            }
            _ => {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl+C received, shutting down...");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
