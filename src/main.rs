//! Notification relay server binary.

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use notification_relay::adapters::http::{app_router, serve};
use notification_relay::adapters::{LoggingEmailSender, RedisBroker, WebSocketState};
use notification_relay::application::{
    BrokerConnector, ClientRegistry, MissedNotificationBuffer, NotificationDispatcher,
    NotificationRelay, SubscriptionManager,
};
use notification_relay::config::AppConfig;
use notification_relay::telemetry;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = telemetry::init(&config.server) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Notification relay stopped with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), BoxError> {
    if let Err(e) = config.notifications.parsed_channel() {
        tracing::warn!("{}; notifications will be dropped", e);
    }

    let broker = RedisBroker::new(&config.broker.url)?;
    let connector = Arc::new(BrokerConnector::new(
        Arc::new(broker),
        config.broker.retry_policy(),
    ));

    let registry = Arc::new(ClientRegistry::with_buffer(
        config.notifications.send_timeout(),
        MissedNotificationBuffer::from_capacity(config.notifications.missed_capacity),
    ));
    let email = Arc::new(LoggingEmailSender::new(
        config.notifications.email_recipient.clone(),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        &config.notifications.channel,
        Arc::clone(&registry),
        email,
    ));
    let subscriptions = SubscriptionManager::for_relay_topics(
        Arc::clone(&connector),
        dispatcher,
        config.broker.subscription_capacity,
    );
    let relay = Arc::new(NotificationRelay::new(connector, subscriptions));

    relay.start().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut relay_task = tokio::spawn({
        let relay = Arc::clone(&relay);
        async move { relay.run(shutdown_rx).await }
    });

    let listener = TcpListener::bind(config.server.bind_address()).await?;
    let router = app_router(WebSocketState::new(registry));

    tracing::info!(
        address = %config.server.bind_address(),
        channel = %config.notifications.channel,
        broker = %config.broker.url,
        "Notification relay started"
    );

    tokio::select! {
        result = &mut relay_task => {
            // The relay only returns on its own after a fatal broker failure.
            result??;
            return Ok(());
        }
        result = serve(listener, router, shutdown_signal()) => {
            result?;
        }
    }

    let _ = shutdown_tx.send(true);
    relay_task.await??;
    tracing::info!("Notification relay shut down");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
}
