//! Settlement engine binary: config, pool, adapters, router.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use suscribot_settlement::adapters::bancard::{BancardAdapter, BancardConfig};
use suscribot_settlement::adapters::crypto::{CryptoGatewayConfig, CryptoTransferAdapter};
use suscribot_settlement::adapters::http::{settlement_router, SettlementAppState};
use suscribot_settlement::adapters::pagopar::{PagoparAdapter, PagoparConfig};
use suscribot_settlement::adapters::postgres::{
    PostgresPaymentRepository, PostgresServiceCatalog, PostgresSubscriptionRepository,
};
use suscribot_settlement::adapters::stripe::{StripeCheckoutAdapter, StripeConfig};
use suscribot_settlement::application::{
    PaymentLedger, RetryPolicy, SettlementOrchestrator, SubscriptionManager,
};
use suscribot_settlement::config::AppConfig;
use suscribot_settlement::domain::pricing::RateConverter;
use suscribot_settlement::ports::GatewayRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let catalog = Arc::new(PostgresServiceCatalog::new(pool.clone()));
    let ledger = PaymentLedger::new(Arc::new(PostgresPaymentRepository::new(pool.clone())));
    let subscriptions = SubscriptionManager::new(
        Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        catalog.clone(),
    );

    let converter = RateConverter::new(config.gateways.rate_table())?;
    let timeout = Duration::from_secs(config.gateways.call_timeout_secs);

    let stripe = &config.gateways.stripe;
    let mut stripe_config = StripeConfig::new(
        stripe.api_key.clone(),
        stripe.webhook_secret.clone(),
        stripe.success_url.clone(),
        stripe.cancel_url.clone(),
    );
    stripe_config.timeout = timeout;

    let pagopar = &config.gateways.pagopar;
    let mut pagopar_config = PagoparConfig::new(
        pagopar.public_key.clone(),
        pagopar.private_key.clone(),
        pagopar.return_url.clone(),
    );
    pagopar_config.timeout = timeout;
    if pagopar.sandbox {
        pagopar_config = pagopar_config.with_base_url("https://api-sandbox.pagopar.com/api");
    }

    let bancard = &config.gateways.bancard;
    let mut bancard_config = BancardConfig::new(
        bancard.public_key.clone(),
        bancard.private_key.clone(),
        bancard.return_url.clone(),
    );
    bancard_config.timeout = timeout;
    if bancard.sandbox {
        bancard_config = bancard_config.with_base_url("https://vpos.infonet.com.py:8888");
    }

    let crypto = &config.gateways.crypto;
    let crypto_config = CryptoGatewayConfig {
        wallet_address: crypto.wallet_address.clone(),
        network: crypto.network.clone(),
    };

    let gateways = GatewayRegistry::new()
        .register(Arc::new(StripeCheckoutAdapter::new(stripe_config)))
        .register(Arc::new(PagoparAdapter::new(pagopar_config)))
        .register(Arc::new(BancardAdapter::new(bancard_config)))
        .register(Arc::new(CryptoTransferAdapter::new(crypto_config)));

    let orchestrator = Arc::new(SettlementOrchestrator::new(
        catalog,
        converter,
        ledger,
        subscriptions,
        gateways,
        RetryPolicy::default(),
    ));

    let app = Router::new()
        .nest("/api", settlement_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .with_state(SettlementAppState { orchestrator });

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "settlement engine listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
