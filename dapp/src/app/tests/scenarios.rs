//! # Scenario Tests
//!
//! End-to-end flows through a started [`App`]: provider events drive the session, session
//! changes drive the cache.

use super::*;
use crate::core::error::AppError;
use crate::core::service::ProviderEvent;
use mock::{INPUT_TOKEN, OTHER_ACCOUNT, OUTPUT_TOKEN};

const SALE_READS: [&str; 6] = [
    "eth_call:remainingSupply",
    "eth_call:burnedInput",
    "eth_call:inputToLP",
    "eth_call:swappedInput",
    "eth_call:inputToken",
    "eth_call:token",
];

async fn started_app(provider: &Arc<MockProvider>) -> App {
    let app = App::new(provider.clone(), test_settings());
    app.start().await;
    app
}

#[tokio::test]
async fn test_start_reads_session_and_contracts() {
    let provider = MockProvider::new();
    provider.set_accounts(vec![ACCOUNT.to_lowercase()]);
    provider.set_block(77);
    provider.set_allowance(Amount::from_whole(3));

    let app = started_app(&provider).await;
    let view = wait_for_view(&app, |v| v.contracts.approved_amount.is_some()).await;

    assert!(view.is_installed);
    assert!(view.is_connected);
    assert_eq!(view.session.address.map(|a| a.to_string()).as_deref(), Some(ACCOUNT));
    assert_eq!(view.session.chain_id, Some(1130));
    assert_eq!(view.session.block_height, Some(77));
    assert_eq!(view.contracts.input_token_address, Some(address(INPUT_TOKEN)));
    assert_eq!(view.contracts.output_token_address, Some(address(OUTPUT_TOKEN)));
    assert_eq!(view.contracts.approved_amount, Some(Amount::from_whole(3)));
    assert_eq!(view.remaining_percent.as_deref(), Some("75.00000000"));
    assert!(!view.needs_chain_change);
}

#[tokio::test]
async fn test_not_installed_is_published() {
    let provider = MockProvider::not_installed();
    let app = started_app(&provider).await;
    assert!(!app.view().is_installed);
}

#[tokio::test]
async fn test_disconnect_event_clears_connection() {
    let provider = MockProvider::new();
    provider.set_accounts(vec![ACCOUNT.to_string()]);
    provider.set_block(12);
    let app = started_app(&provider).await;
    wait_for_view(&app, |v| v.contracts.approved_amount.is_some()).await;

    provider.push(ProviderEvent::AccountsChanged(vec![]));
    let view = wait_for_view(&app, |v| {
        !v.is_connected && v.contracts.approved_amount.is_none()
    })
    .await;

    assert_eq!(view.session.address, None);
    assert_eq!(view.session.chain_id, Some(1130));
    assert_eq!(view.session.block_height, Some(12));
    assert_eq!(view.contracts.approved_amount, None);
    assert!(view.needs_approval);
}

#[tokio::test]
async fn test_account_switch_rereads_token_scoped() {
    let provider = MockProvider::new();
    provider.set_accounts(vec![ACCOUNT.to_string()]);
    provider.set_allowance(Amount::from_whole(5));
    let app = started_app(&provider).await;
    wait_for_view(&app, |v| v.contracts.approved_amount == Some(Amount::from_whole(5))).await;

    provider.set_allowance(Amount::from_whole(8));
    provider.push(ProviderEvent::AccountsChanged(vec![OTHER_ACCOUNT.to_string()]));

    let view = wait_for_view(&app, |v| {
        v.session.address == Some(address(OTHER_ACCOUNT))
            && v.contracts.approved_amount == Some(Amount::from_whole(8))
    })
    .await;
    assert!(view.is_connected);
}

#[tokio::test]
async fn test_new_block_reissues_every_read() {
    let provider = MockProvider::new();
    provider.set_accounts(vec![ACCOUNT.to_string()]);
    let app = started_app(&provider).await;
    wait_for_view(&app, |v| v.contracts.burned_input.is_some()).await;

    provider.fail_method("burnedInput");
    provider.set_burned_input(Amount::from_whole(9_999));
    provider.set_remaining_supply(Amount::from_whole(5_000_000));
    provider.clear_calls();
    provider.push(ProviderEvent::NewBlock(2));

    wait_for_view(&app, |v| {
        v.session.block_height == Some(2)
            && v.contracts.remaining_supply == Some(Amount::from_whole(5_000_000))
    })
    .await;

    eventually(|| SALE_READS.iter().all(|read| provider.call_count(read) >= 1)).await;
    assert_eq!(app.view().contracts.burned_input, Some(Amount::from_whole(1_334)));
}

#[tokio::test]
async fn test_chain_mismatch_gates_until_switched() {
    let provider = MockProvider::new();
    provider.set_chain_id(1131);
    let app = connected_app(&provider).await;

    let view = app.view();
    assert_eq!(view.session.chain_id, Some(1131));
    assert!(view.needs_chain_change);
    assert_eq!(
        app.approve(Amount::from_whole(10)).await.unwrap(),
        GateOutcome::Dropped(DropReason::WrongChain {
            expected: 1130,
            actual: 1131,
        })
    );

    assert_eq!(app.switch_network().await.unwrap(), 1130);
    assert!(!app.view().needs_chain_change);

    let outcome = app.approve(Amount::from_whole(10)).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Confirmed(_)));
}

#[tokio::test]
async fn test_chain_changed_event_updates_gate() {
    let provider = MockProvider::new();
    let app = started_app(&provider).await;

    provider.push(ProviderEvent::ChainChanged("0x46b".to_string()));
    let view = wait_for_view(&app, |v| v.session.chain_id == Some(1131)).await;

    assert!(view.needs_chain_change);
}

#[tokio::test]
async fn test_set_amount_publishes_estimate() {
    let provider = MockProvider::new();
    let app = connected_app(&provider).await;

    assert_eq!(app.set_amount("12.5").await.unwrap(), Some(Amount::from_whole(25)));
    app.set_amount("").await.unwrap();
    app.set_amount("0").await.unwrap();

    let view = app.view();
    assert_eq!(view.draft.amount_text, "0");
    assert_eq!(view.draft.estimated_output, Some(Amount::from_whole(25)));
}

#[tokio::test]
async fn test_add_token_to_wallet() {
    let provider = MockProvider::new();
    let app = App::new(provider.clone(), test_settings());

    let err = app.add_token_to_wallet(SaleToken::Output).await.unwrap_err();
    assert!(matches!(err, AppError::NotReady(_)));

    app.reload().await;
    assert!(app.add_token_to_wallet(SaleToken::Output).await.unwrap());
    assert_eq!(provider.call_count("wallet_watchAsset"), 1);
}

#[tokio::test]
async fn test_connect_rejected_leaves_state() {
    let provider = MockProvider::new();
    provider.reject_method("eth_requestAccounts");
    let app = App::new(provider.clone(), test_settings());
    let before = app.view();

    let err = app.connect().await.unwrap_err();

    assert!(matches!(err, AppError::PermissionDenied(_)));
    assert_eq!(app.view(), before);
}
