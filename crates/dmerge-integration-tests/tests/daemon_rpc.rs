//! Integration test: the daemon's JSON-RPC surface, dispatched in process.

use std::sync::Arc;
use std::time::Duration;

use dmerge_daemon::commands;
use dmerge_gateway::LocalWallet;
use dmerge_integration_tests::{call_err, call_ok, test_config, test_daemon, test_daemon_with};
use dmerge_types::view::ViewState;
use dmerge_types::{BannerStatus, Tab};
use serde_json::json;

async fn view(state: &Arc<dmerge_daemon::DaemonState>) -> ViewState {
    serde_json::from_value(call_ok(state, "get_view", json!(null)).await).expect("view state")
}

#[tokio::test]
async fn create_requires_wallet_then_succeeds() {
    let (state, _ledger) = test_daemon().await;

    // No wallet: connection error and an error banner.
    let code = call_err(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;
    assert_eq!(code, -32010);
    let banner = view(&state).await.banner;
    assert_eq!(banner.status, BannerStatus::Error);
    assert_eq!(banner.message, "Please connect wallet first");

    let account = call_ok(&state, "connect_wallet", json!({})).await["account"].clone();
    assert!(account.as_str().is_some_and(|a| a.starts_with("0x")));

    // Create through the modal draft.
    call_ok(&state, "open_create_modal", json!(null)).await;
    let draft = call_ok(
        &state,
        "update_draft",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;
    assert_eq!(draft["submittable"], true);

    let record = call_ok(&state, "create_proposal", json!(null)).await;
    assert_eq!(record["id"], 1);
    assert_eq!(record["treasury"], "FHE-MTA=");
    assert_eq!(record["memberActivity"], "FHE-NQ==");
    assert_eq!(record["valuation"], "FHE-MA==");
    assert_eq!(record["creator"], account);

    let v = view(&state).await;
    assert!(!v.show_create_modal);
    assert_eq!(v.draft, Default::default());
    assert_eq!(v.banner.message, "Merger created successfully!");
    assert!(!v.creating);

    let list = call_ok(&state, "list_proposals", json!(null)).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn empty_draft_is_rejected() {
    let (state, _ledger) = test_daemon().await;
    call_ok(&state, "connect_wallet", json!({})).await;
    let code = call_err(&state, "create_proposal", json!({"name": "Only a name"})).await;
    assert_eq!(code, -32602);
}

#[tokio::test]
async fn declined_write_reports_rejection() {
    let (state, _ledger) = test_daemon().await;
    call_ok(&state, "connect_wallet", json!({"approve_signatures": false})).await;
    let code = call_err(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": 10, "activity": 5}),
    )
    .await;
    assert_eq!(code, -32021);
    assert_eq!(view(&state).await.banner.message, "Transaction rejected by user");
    assert_eq!(call_ok(&state, "list_proposals", json!(null)).await, json!([]));
}

#[tokio::test]
async fn ledger_write_failure_reports_cause() {
    let (state, ledger) = test_daemon().await;
    call_ok(&state, "connect_wallet", json!({})).await;
    ledger.set_write_failure(Some("out of gas")).expect("inject");
    let code = call_err(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;
    assert_eq!(code, -32020);
    assert_eq!(view(&state).await.banner.message, "Submission failed: out of gas");
}

#[tokio::test]
async fn load_failure_keeps_previous_collection() {
    let (state, ledger) = test_daemon().await;
    call_ok(&state, "connect_wallet", json!({})).await;
    call_ok(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;

    ledger.set_read_failure(Some("rpc timeout")).expect("inject");
    let code = call_err(&state, "refresh_proposals", json!(null)).await;
    assert_eq!(code, -32010);
    assert_eq!(view(&state).await.banner.message, "Failed to load data");
    assert!(!view(&state).await.refreshing);

    let list = call_ok(&state, "list_proposals", json!(null)).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn reveal_toggle_and_analysis() {
    let (state, _ledger) = test_daemon().await;
    call_ok(&state, "connect_wallet", json!({})).await;
    call_ok(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;

    // Reveal needs an open record.
    assert_eq!(call_err(&state, "reveal_field", json!({"field": "treasury"})).await, -32602);
    assert_eq!(call_err(&state, "select_proposal", json!({"id": 9})).await, -32060);

    call_ok(&state, "select_proposal", json!({"id": 1})).await;
    let revealed = call_ok(&state, "reveal_field", json!({"field": "treasury"})).await;
    assert_eq!(revealed["outcome"], "revealed");
    assert_eq!(revealed["value"], 10.0);
    assert_eq!(view(&state).await.decrypted_treasury, Some(10.0));

    let analysis = call_ok(&state, "get_analysis", json!(null)).await;
    assert_eq!(analysis["analysis"], json!({"synergyScore": 70, "valuationDiff": 7, "compatibility": 50}));
    assert_eq!(analysis["bars"]["synergy"], 70);

    let hidden = call_ok(&state, "reveal_field", json!({"field": "treasury"})).await;
    assert_eq!(hidden["outcome"], "hidden");
    assert_eq!(view(&state).await.decrypted_treasury, None);

    let dashboard = call_ok(&state, "get_dashboard", json!(null)).await;
    assert_eq!(dashboard, json!({"totalProposals": 1, "totalTreasury": 10.0, "averageActivity": 5.0}));

    assert_eq!(call_ok(&state, "close_proposal", json!(null)).await["closed"], true);
    assert_eq!(view(&state).await.selected, None);
}

#[tokio::test]
async fn reveal_without_wallet_is_auth_error() {
    let (state, _ledger) = test_daemon().await;
    call_ok(&state, "connect_wallet", json!({})).await;
    call_ok(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;
    call_ok(&state, "disconnect_wallet", json!(null)).await;
    call_ok(&state, "select_proposal", json!({"id": 1})).await;

    assert_eq!(call_err(&state, "reveal_field", json!({"field": "activity"})).await, -32040);
    assert_eq!(view(&state).await.banner.message, "Please connect wallet first");
}

#[tokio::test]
async fn declined_signature_leaves_field_hidden() {
    let (state, _ledger) = test_daemon().await;
    let wallet = Arc::new(LocalWallet::generate());
    state.session.connect(wallet.clone()).await;
    call_ok(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;
    call_ok(&state, "select_proposal", json!({"id": 1})).await;

    wallet.set_approve(false);
    let outcome = call_ok(&state, "reveal_field", json!({"field": "activity"})).await;
    assert_eq!(outcome["outcome"], "not_revealed");
    assert_eq!(view(&state).await.decrypted_activity, None);
}

#[tokio::test]
async fn reveal_from_closed_view_is_discarded() {
    let mut config = test_config();
    config.ui.reveal_delay_ms = 300;
    let (state, _ledger) = test_daemon_with(config).await;
    let wallet = Arc::new(LocalWallet::generate());
    state.session.connect(wallet.clone()).await;
    call_ok(
        &state,
        "create_proposal",
        json!({"name": "Acme DAO", "treasury": "10", "activity": "5"}),
    )
    .await;
    call_ok(&state, "select_proposal", json!({"id": 1})).await;

    let reveal = {
        let state = Arc::clone(&state);
        tokio::spawn(async move { call_ok(&state, "reveal_field", json!({"field": "treasury"})).await })
    };

    // Close and reopen the same record while the first reveal is signing.
    tokio::time::sleep(Duration::from_millis(50)).await;
    call_ok(&state, "close_proposal", json!(null)).await;
    call_ok(&state, "select_proposal", json!({"id": 1})).await;

    let outcome = reveal.await.expect("reveal task");
    assert_eq!(outcome["outcome"], "discarded");
    assert!(outcome["value"].is_null());
    let view = view(&state).await;
    assert_eq!(view.selected, Some(1));
    assert_eq!(view.decrypted_treasury, None);
    assert_eq!(wallet.signature_count(), 1);
}

#[tokio::test]
async fn navigation_and_static_content() {
    let (state, _ledger) = test_daemon().await;
    assert_eq!(view(&state).await.active_tab, Tab::Dashboard);
    call_ok(&state, "set_tab", json!({"tab": "partners"})).await;
    assert_eq!(view(&state).await.active_tab, Tab::Partners);
    assert_eq!(call_err(&state, "set_tab", json!({"tab": "settings"})).await, -32602);

    let faq = call_ok(&state, "get_faq", json!(null)).await;
    assert_eq!(faq.as_array().map(Vec::len), Some(5));
    let partners = call_ok(&state, "get_partners", json!(null)).await;
    assert_eq!(partners[2]["name"], "DAO Alliance");

    assert_eq!(call_err(&state, "no_such_method", json!(null)).await, -32601);
}

#[tokio::test]
async fn signature_context_and_status() {
    let (state, _ledger) = test_daemon().await;
    let ctx = call_ok(&state, "get_signature_context", json!(null)).await;
    let message = ctx["message"].as_str().expect("message").to_string();
    let lines: Vec<_> = message.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("publickey:0x"));
    assert_eq!(lines[0].len(), "publickey:0x".len() + 2000);
    assert_eq!(lines[1], format!("contractAddresses:{}", dmerge_integration_tests::TEST_CONTRACT));
    assert_eq!(lines[2], "contractsChainId:31337");
    assert_eq!(lines[4], "durationDays:30");

    let status = call_ok(&state, "get_status", json!(null)).await;
    assert_eq!(status["available"], true);
    assert_eq!(status["proposals"], 0);
    assert_eq!(status["ledger_backend"], "memory");
}

#[tokio::test]
async fn startup_load_shows_availability_banner() {
    let (state, _ledger) = test_daemon().await;
    let count = commands::proposals::load(&state).await.expect("load");
    assert_eq!(count, 0);
    let banner = view(&state).await.banner;
    assert_eq!(banner.status, BannerStatus::Success);
    assert_eq!(banner.message, "Contract is available!");
}

#[tokio::test]
async fn unavailable_contract_suppresses_banner() {
    let (state, ledger) = test_daemon().await;
    ledger.set_available(false);
    commands::proposals::load(&state).await.expect("load still works");
    assert!(!view(&state).await.banner.visible);
}

#[tokio::test]
async fn configured_key_gives_stable_account() {
    let (state, _ledger) = test_daemon().await;
    let secret = "0x".to_string() + &"11".repeat(32);
    let first = call_ok(&state, "connect_wallet", json!({"secret_key": secret})).await;
    call_ok(&state, "disconnect_wallet", json!(null)).await;
    let second = call_ok(&state, "connect_wallet", json!({"secret_key": secret})).await;
    assert_eq!(first["account"], second["account"]);
    assert_eq!(call_ok(&state, "get_account", json!(null)).await["account"], first["account"]);

    assert_eq!(call_err(&state, "connect_wallet", json!({"secret_key": "0xzz"})).await, -32030);
}
