//! # dapp-monitor
//!
//! Runs the sale dApp core against a node and logs every published snapshot until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use dapp::app::state::{SaleView, BURN_SHARE_BPS, LP_SHARE_BPS};
use dapp::app::App;
use dapp::config::DappConfig;
use dapp::debug::{self, LogConfig};
use dapp::services::{ws, JsonRpcProvider};
use shared::utils::truncate_address;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = debug::init_logger(&LogConfig::from_env());

    let config = DappConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let settings = config.sale_settings()?;

    let provider = Arc::new(JsonRpcProvider::new(config.rpc_url.clone())?);
    let mut tasks = vec![provider.spawn_watcher(config.poll_interval)];
    if let Some(ws_url) = &config.ws_url {
        tasks.push(ws::spawn_new_heads(ws_url.clone(), provider.event_sender()));
    }

    info!(
        rpc_url = %config.rpc_url,
        chain = settings.chain.chain_name,
        sale = %truncate_address(&settings.sale_contract.to_string()),
        burn_share_bps = BURN_SHARE_BPS,
        lp_share_bps = LP_SHARE_BPS,
        "Starting dapp-monitor"
    );

    let app = App::new(provider, settings);
    app.start().await;

    let mut views = app.subscribe();
    log_view(&views.borrow_and_update());
    loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                log_view(&views.borrow_and_update());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    for task in tasks {
        task.abort();
    }
    Ok(())
}

fn log_view(view: &SaleView) {
    let account = view
        .session
        .address
        .map(|a| truncate_address(&a.to_string()))
        .unwrap_or_else(|| "-".to_string());
    let show = |amount: Option<dapp::services::Amount>| {
        amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
    };

    info!(
        account = %account,
        chain_id = ?view.session.chain_id,
        block = ?view.session.block_height,
        needs_chain_change = view.needs_chain_change,
        remaining = %show(view.contracts.remaining_supply),
        remaining_percent = view.remaining_percent.as_deref().unwrap_or("-"),
        burned = %show(view.contracts.burned_input),
        to_lp = %show(view.contracts.input_to_lp),
        swapped = %show(view.contracts.swapped_input),
        allowance = %show(view.contracts.approved_amount),
        balance = %show(view.contracts.balance_of_input_token),
        gate = ?view.draft.gate,
        "Sale snapshot"
    );
}
