//! # App Tests
//!
//! Scenario tests for the wired-up [`App`] against the scripted [`mock::MockProvider`].


mod gate;
mod scenarios;

use std::sync::Arc;
use std::time::Duration;

use shared::chain::METACHAIN;

use super::*;
use mock::{address, MockProvider, ACCOUNT, SALE};

const WAIT: Duration = Duration::from_secs(5);

pub fn test_settings() -> SaleSettings {
    SaleSettings {
        sale_contract: address(SALE),
        chain: &METACHAIN,
        receipt_poll_interval: Duration::from_millis(1),
    }
}

/// App with `ACCOUNT` connected and one full refresh done. Background tasks are not started.
pub async fn connected_app(provider: &Arc<MockProvider>) -> App {
    provider.set_accounts(vec![ACCOUNT.to_string()]);
    let app = App::new(provider.clone(), test_settings());
    app.connect().await.unwrap();
    app.reload().await;
    app
}

/// Wait until the published view satisfies `predicate`.
pub async fn wait_for_view(app: &App, predicate: impl FnMut(&SaleView) -> bool) -> SaleView {
    let mut views = app.subscribe();
    let view = tokio::time::timeout(WAIT, views.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("view channel closed")
        .clone();
    view
}

/// Poll `condition` until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let polling = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(WAIT, polling)
        .await
        .expect("condition never held");
}
