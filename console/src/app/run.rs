//! Daemon run loop

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::options::{AppOptions, LifecycleOptions};
use crate::app::state::AppState;
use crate::errors::ConsoleError;
use crate::notify::Notification;
use crate::workers::{poller, watcher};

/// Run the console daemon
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Initializing Quarry console daemon...");

    let (shutdown_tx, _shutdown_rx): (broadcast::Sender<()>, _) = broadcast::channel(1);
    let mut shutdown_manager = ShutdownManager::new(shutdown_tx.clone(), options.lifecycle.clone());

    let (app_state, notifications) = AppState::init(&options)?;
    let app_state = Arc::new(app_state);

    init_notification_printer(notifications, &mut shutdown_manager, shutdown_tx.subscribe())?;

    if options.enable_poller {
        init_poller_worker(
            options.poller.clone(),
            app_state.clone(),
            &mut shutdown_manager,
            shutdown_tx.subscribe(),
        )?;
    }

    if options.enable_watcher {
        init_watcher_worker(app_state.clone(), &mut shutdown_manager, shutdown_tx.subscribe())?;
    }

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    drop(shutdown_tx);
    shutdown_manager.shutdown().await
}

fn init_notification_printer(
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => return,
                notification = notifications.recv() => {
                    match notification {
                        Some(notification) => println!("{}", notification.render()),
                        None => return,
                    }
                }
            }
        }
    });

    shutdown_manager.with_printer_handle(handle)
}

fn init_poller_worker(
    options: poller::Options,
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing poller worker...");

    let flows = app_state.flows.clone();

    let handle = tokio::spawn(async move {
        poller::run(
            &options,
            flows.as_ref(),
            |wait| tokio::time::sleep(wait),
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_poller_handle(handle)
}

fn init_watcher_worker(
    app_state: Arc<AppState>,
    shutdown_manager: &mut ShutdownManager,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), ConsoleError> {
    info!("Initializing event watcher worker...");

    let salt_base_url = app_state.salt_base_url.clone();
    let session = app_state.session.clone();
    let flows = app_state.flows.clone();

    let handle = tokio::spawn(async move {
        watcher::run(
            salt_base_url,
            session,
            flows,
            Box::pin(async move {
                let _ = shutdown_rx.recv().await;
            }),
        )
        .await;
    });

    shutdown_manager.with_watcher_handle(handle)
}

// ================================= SHUTDOWN ===================================== //

struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    lifecycle_options: LifecycleOptions,
    printer_handle: Option<JoinHandle<()>>,
    poller_handle: Option<JoinHandle<()>>,
    watcher_handle: Option<JoinHandle<()>>,
}

impl ShutdownManager {
    fn new(shutdown_tx: broadcast::Sender<()>, lifecycle_options: LifecycleOptions) -> Self {
        Self {
            shutdown_tx,
            lifecycle_options,
            printer_handle: None,
            poller_handle: None,
            watcher_handle: None,
        }
    }

    fn with_printer_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.printer_handle.is_some() {
            return Err(ConsoleError::ShutdownError("printer_handle already set".to_string()));
        }
        self.printer_handle = Some(handle);
        Ok(())
    }

    fn with_poller_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.poller_handle.is_some() {
            return Err(ConsoleError::ShutdownError("poller_handle already set".to_string()));
        }
        self.poller_handle = Some(handle);
        Ok(())
    }

    fn with_watcher_handle(&mut self, handle: JoinHandle<()>) -> Result<(), ConsoleError> {
        if self.watcher_handle.is_some() {
            return Err(ConsoleError::ShutdownError("watcher_handle already set".to_string()));
        }
        self.watcher_handle = Some(handle);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ConsoleError> {
        let _ = self.shutdown_tx.send(());

        match tokio::time::timeout(
            self.lifecycle_options.max_shutdown_delay,
            self.shutdown_impl(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(
                    "Shutdown timed out after {:?}, forcing shutdown...",
                    self.lifecycle_options.max_shutdown_delay
                );
                std::process::exit(1);
            }
        }
    }

    async fn shutdown_impl(&mut self) -> Result<(), ConsoleError> {
        info!("Shutting down Quarry console daemon...");

        // 1. Poller worker
        if let Some(handle) = self.poller_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 2. Event watcher
        if let Some(handle) = self.watcher_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        // 3. Notification printer
        if let Some(handle) = self.printer_handle.take() {
            handle
                .await
                .map_err(|e| ConsoleError::ShutdownError(e.to_string()))?;
        }

        info!("Shutdown complete");
        Ok(())
    }
}
