use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use swap_cycler::{
    chain::{Chain, EthersChain},
    config::AppConfig,
    engine::{CycleScheduler, LifetimeBudget, within_lifetime},
    utils,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "[INIT] configuration loaded");

    // The lifetime starts before any network I/O so a stalled node cannot outlive it.
    let mut rng = StdRng::from_entropy();
    let budget = LifetimeBudget::draw(&config.bounds.lifetime_secs, &mut rng);
    tracing::info!(lifetime_secs = budget.total_secs(), "[TIMER] countdown started");

    let trading = async {
        let chain = Arc::new(
            EthersChain::connect(
                &config.rpc_url,
                &config.wallet_secret,
                config.chain_id,
                config.quoter,
            )
            .await?,
        );
        let market = Arc::new(config.market.clone());

        tracing::info!(
            wallet = ?chain.signer_address(),
            token = %market.token.symbol,
            pool = ?market.token.pool_address,
            mode = %config.mode,
            buy = %config.bounds.buy_amount,
            sell = %config.bounds.sell_amount,
            wait_ms = %config.bounds.wait_ms,
            lifetime_secs = budget.total_secs(),
            "[INIT] swap-cycler starting"
        );

        let mut scheduler = CycleScheduler::new(
            chain,
            market,
            config.mode,
            config.bounds,
            budget.clone(),
            rng,
        );
        anyhow::Ok(scheduler.run().await)
    };

    match within_lifetime(budget.clone(), trading).await {
        None => tracing::warn!("[EXIT] lifetime elapsed, stopping"),
        Some(Ok(fatal)) => tracing::error!(error = %fatal, "[EXIT] trading loop stopped"),
        Some(Err(err)) => tracing::error!(error = %err, "[EXIT] startup failed"),
    }

    // Every path is an abnormal termination for the supervisor.
    std::process::exit(1);
}
