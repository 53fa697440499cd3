//! # Transaction Gate Tests
//!
//! Lock exclusion, allowance gating and cleanup after failed submissions.

use super::*;
use crate::core::error::AppError;

fn approvals(provider: &MockProvider) -> usize {
    provider.call_count("eth_sendTransaction:approve")
}

fn purchases(provider: &MockProvider) -> usize {
    provider.call_count("eth_sendTransaction:getToken")
}

#[tokio::test]
async fn test_approve_then_buy() {
    let provider = MockProvider::new();
    let app = connected_app(&provider).await;
    let amount = Amount::from_whole(100);
    assert!(app.needs_approval(amount));

    let outcome = app.approve(amount).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Confirmed(_)));
    assert_eq!(app.view().contracts.approved_amount, Some(amount));
    assert!(!app.needs_approval(amount));

    let outcome = app.buy(amount).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Confirmed(_)));

    let view = app.view();
    assert_eq!(view.contracts.approved_amount, Some(Amount::ZERO));
    assert_eq!(view.contracts.balance_of_input_token, Some(Amount::from_whole(900)));
    assert_eq!(view.contracts.remaining_supply, Some(Amount::from_whole(5_999_800)));
    assert_eq!(view.draft.gate, GateState::Idle);
}

#[tokio::test]
async fn test_buy_never_submits_below_allowance() {
    let provider = MockProvider::new();
    provider.set_allowance(Amount::from_whole(50));
    let app = connected_app(&provider).await;

    let outcome = app.buy(Amount::from_whole(100)).await.unwrap();

    assert_eq!(
        outcome,
        GateOutcome::Dropped(DropReason::InsufficientAllowance {
            approved: Amount::from_whole(50),
            requested: Amount::from_whole(100),
        })
    );
    assert_eq!(purchases(&provider), 0);
    assert_eq!(app.view().draft.gate, GateState::Idle);
}

#[tokio::test]
async fn test_buy_allowed_with_unknown_allowance() {
    let provider = MockProvider::new();
    provider.set_allowance(Amount::from_whole(10));
    let app = connected_app(&provider).await;
    app.state.update(|s| s.contracts.approved_amount = None);

    let outcome = app.buy(Amount::from_whole(10)).await.unwrap();

    assert!(matches!(outcome, GateOutcome::Confirmed(_)));
    assert_eq!(purchases(&provider), 1);
}

#[tokio::test]
async fn test_lock_excludes_second_request() {
    let provider = MockProvider::new();
    provider.hold_sends();
    let app = Arc::new(connected_app(&provider).await);

    let first = tokio::spawn({
        let app = Arc::clone(&app);
        async move { app.approve(Amount::from_whole(100)).await }
    });
    wait_for_view(&app, |v| v.draft.gate == GateState::Approving).await;

    for _ in 0..5 {
        assert_eq!(
            app.approve(Amount::from_whole(1)).await.unwrap(),
            GateOutcome::Dropped(DropReason::Busy)
        );
        assert_eq!(
            app.buy(Amount::ZERO).await.unwrap(),
            GateOutcome::Dropped(DropReason::Busy)
        );
    }
    assert!(app.view().draft.is_submitting());

    provider.release_send();
    let outcome = first.await.unwrap().unwrap();

    assert!(matches!(outcome, GateOutcome::Confirmed(_)));
    assert_eq!(approvals(&provider), 1);
    assert_eq!(purchases(&provider), 0);
    assert_eq!(provider.allowance(), Amount::from_whole(100));
    assert!(!app.view().draft.is_submitting());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_requests_admit_one() {
    const CALLERS: usize = 16;
    let provider = MockProvider::new();
    provider.set_allowance(Amount::from_whole(1_000));
    provider.hold_sends();
    let app = Arc::new(connected_app(&provider).await);
    let start = Arc::new(tokio::sync::Barrier::new(CALLERS));

    let callers: Vec<_> = (0..CALLERS)
        .map(|i| {
            let app = Arc::clone(&app);
            let start = Arc::clone(&start);
            tokio::spawn(async move {
                start.wait().await;
                if i % 2 == 0 {
                    app.approve(Amount::from_whole(10)).await
                } else {
                    app.buy(Amount::from_whole(10)).await
                }
            })
        })
        .collect();

    eventually(|| callers.iter().filter(|c| c.is_finished()).count() == CALLERS - 1).await;
    assert!(app.view().draft.is_submitting());
    provider.release_send();

    let mut confirmed = 0;
    for caller in callers {
        match caller.await.unwrap().unwrap() {
            GateOutcome::Confirmed(_) => confirmed += 1,
            GateOutcome::Dropped(reason) => assert_eq!(reason, DropReason::Busy),
        }
    }
    assert_eq!(confirmed, 1);
    assert_eq!(approvals(&provider) + purchases(&provider), 1);
    assert!(!app.view().draft.is_submitting());
}

#[tokio::test]
async fn test_failed_approve_releases_lock_and_refreshes() {
    let provider = MockProvider::new();
    let app = connected_app(&provider).await;
    let allowance_reads = provider.call_count("eth_call:allowance");

    provider.fail_method("approve");
    let err = app.approve(Amount::from_whole(100)).await.unwrap_err();

    assert!(matches!(err, AppError::WriteFailure(_)));
    assert_eq!(app.view().draft.gate, GateState::Idle);
    assert_eq!(provider.call_count("eth_call:allowance"), allowance_reads + 1);
    assert_eq!(app.view().contracts.approved_amount, Some(Amount::ZERO));

    provider.heal_method("approve");
    let outcome = app.approve(Amount::from_whole(100)).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Confirmed(_)));

    let outcome = app.buy(Amount::from_whole(100)).await.unwrap();
    assert!(matches!(outcome, GateOutcome::Confirmed(_)));
}

#[tokio::test]
async fn test_rejected_approve_is_permission_denied() {
    let provider = MockProvider::new();
    let app = connected_app(&provider).await;
    provider.reject_method("approve");

    let err = app.approve(Amount::from_whole(5)).await.unwrap_err();

    assert!(matches!(err, AppError::PermissionDenied(_)));
    assert!(!app.view().draft.is_submitting());
}

#[tokio::test]
async fn test_reverted_buy_is_write_failure() {
    let provider = MockProvider::new();
    provider.set_balance(Amount::from_whole(1));
    let app = connected_app(&provider).await;
    app.approve(Amount::from_whole(100)).await.unwrap();
    let remaining_reads = provider.call_count("eth_call:remainingSupply");

    let err = app.buy(Amount::from_whole(100)).await.unwrap_err();

    assert!(matches!(err, AppError::WriteFailure(_)));
    assert_eq!(app.view().draft.gate, GateState::Idle);
    assert_eq!(
        provider.call_count("eth_call:remainingSupply"),
        remaining_reads + 1
    );
}

#[tokio::test]
async fn test_dropped_when_not_connected() {
    let provider = MockProvider::new();
    let app = App::new(provider.clone(), test_settings());
    app.reload().await;

    assert_eq!(
        app.approve(Amount::from_whole(1)).await.unwrap(),
        GateOutcome::Dropped(DropReason::NotConnected)
    );
    assert_eq!(
        app.buy(Amount::from_whole(1)).await.unwrap(),
        GateOutcome::Dropped(DropReason::NotConnected)
    );
    assert!(provider.calls().iter().all(|c| !c.starts_with("eth_sendTransaction")));
}

#[tokio::test]
async fn test_approve_dropped_before_token_is_known() {
    let provider = MockProvider::new();
    provider.set_accounts(vec![ACCOUNT.to_string()]);
    let app = App::new(provider.clone(), test_settings());
    app.connect().await.unwrap();

    assert_eq!(
        app.approve(Amount::from_whole(1)).await.unwrap(),
        GateOutcome::Dropped(DropReason::TokenUnknown)
    );
    assert_eq!(app.view().draft.gate, GateState::Idle);
}

#[tokio::test]
async fn test_submit_picks_approve_then_buy() {
    let provider = MockProvider::new();
    let app = connected_app(&provider).await;

    app.set_amount("40").await.unwrap();
    assert!(app.view().needs_approval);
    app.submit().await.unwrap();
    assert_eq!(approvals(&provider), 1);
    assert!(!app.view().needs_approval);

    app.submit().await.unwrap();
    assert_eq!(purchases(&provider), 1);
    assert_eq!(approvals(&provider), 1);
}

#[tokio::test]
async fn test_submit_rejects_invalid_amount() {
    let provider = MockProvider::new();
    let app = connected_app(&provider).await;

    app.set_amount("").await.unwrap();
    assert!(matches!(app.submit().await, Err(AppError::Validation(_))));
    assert!(app.set_amount("1.2.3").await.is_err());
    assert!(matches!(app.submit().await, Err(AppError::Validation(_))));
}
