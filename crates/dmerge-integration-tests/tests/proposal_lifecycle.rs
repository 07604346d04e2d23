//! Integration test: proposal lifecycle on a durable ledger.
//!
//! 1. Open a SQLite-backed ledger and an empty store
//! 2. Create a proposal from form text with a connected wallet
//! 3. Reopen the ledger file and confirm the record survived
//! 4. Reveal both fields through signatures and score the merger
//! 5. Aggregate the dashboard
//!
//! Library crates only; no daemon process.

use std::sync::Arc;
use std::time::Duration;

use dmerge_analysis::{analyze_record, summarize};
use dmerge_crypto::codec;
use dmerge_gateway::{ContractGateway, Ledger, LocalWallet, SqliteLedger, Wallet};
use dmerge_integration_tests::{temp_dir, TEST_CONTRACT};
use dmerge_reveal::{DetailView, RevealOutcome, Revealer, SignatureContext};
use dmerge_store::ProposalStore;
use dmerge_types::{ProposalDraft, RevealField, MERGERS_SLOT};

#[tokio::test]
async fn proposal_survives_reopen_and_reveals() {
    let dir = temp_dir();
    let path = dir.path().join("lifecycle.db");

    // =========================================================
    // Step 1: Empty ledger, empty store
    // =========================================================
    let ledger = Arc::new(SqliteLedger::open(&path, TEST_CONTRACT).expect("open ledger"));
    let store = ProposalStore::new(ContractGateway::new(ledger.clone()));
    assert_eq!(store.refresh().await.expect("refresh"), 0);

    // =========================================================
    // Step 2: Create from the form
    // =========================================================
    let wallet = Arc::new(LocalWallet::generate());
    let draft = ProposalDraft {
        name: "Acme DAO".into(),
        treasury: "10".into(),
        activity: "5".into(),
    };
    let record = store
        .create_from_draft(&draft, Some(wallet.clone() as Arc<dyn Wallet>))
        .await
        .expect("create");
    assert_eq!(record.id, 1);
    assert_eq!(record.treasury_encoded, "FHE-MTA=");
    assert_eq!(record.activity_encoded, "FHE-NQ==");
    assert_eq!(record.valuation_encoded, codec::encode(0.0));
    assert_eq!(record.creator, wallet.account());

    let history = ledger.history(MERGERS_SLOT).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].writer, wallet.account());
    drop(store);
    drop(ledger);

    // =========================================================
    // Step 3: Reopen from disk
    // =========================================================
    let reopened = Arc::new(SqliteLedger::open(&path, TEST_CONTRACT).expect("reopen"));
    assert_eq!(reopened.get_data(MERGERS_SLOT).await.expect("slot").version, 1);
    let store = ProposalStore::new(ContractGateway::new(reopened));
    assert_eq!(store.refresh().await.expect("refresh"), 1);
    let stored = store.get(1).await.expect("record 1");
    assert_eq!(stored, record);

    // =========================================================
    // Step 4: Reveal and analyze
    // =========================================================
    let context = SignatureContext::for_session(TEST_CONTRACT, 31337);
    let revealer = Revealer::new(Arc::new(context)).with_delay(Duration::ZERO);
    let mut view = DetailView::open(stored);
    let signer: Arc<dyn Wallet> = wallet.clone();

    let treasury = view
        .toggle(&revealer, RevealField::Treasury, Some(signer.clone()))
        .await
        .expect("wallet connected");
    let activity = view
        .toggle(&revealer, RevealField::Activity, Some(signer.clone()))
        .await
        .expect("wallet connected");
    assert_eq!(treasury, RevealOutcome::Revealed(10.0));
    assert_eq!(activity, RevealOutcome::Revealed(5.0));
    assert_eq!(wallet.signature_count(), 3, "one write, two reveals");

    let analysis = analyze_record(view.record(), Some(&view.cache()));
    assert_eq!((analysis.synergy_score, analysis.valuation_diff, analysis.compatibility), (70, 7, 50));

    // Hiding takes no signature.
    let hidden = view
        .toggle(&revealer, RevealField::Treasury, Some(signer))
        .await
        .expect("wallet connected");
    assert_eq!(hidden, RevealOutcome::Hidden);
    assert_eq!(wallet.signature_count(), 3);

    // =========================================================
    // Step 5: Dashboard
    // =========================================================
    let records = store.records().await;
    let summary = summarize(&records, Some((1, &view.cache())));
    assert_eq!(summary.total_proposals, 1);
    assert_eq!(summary.total_treasury, 10.0);
    assert_eq!(summary.average_activity, 5.0);
}

#[tokio::test]
async fn legacy_plain_numbers_and_garbage_are_tolerated() {
    let ledger = Arc::new(SqliteLedger::open_memory(TEST_CONTRACT).expect("open"));
    let wallet: Arc<dyn Wallet> = Arc::new(LocalWallet::generate());
    let payload = serde_json::json!([
        {
            "id": 1,
            "name": "Legacy DAO",
            "treasury": "3.5",
            "memberActivity": "FHE-NQ==",
            "valuation": "FHE-MA==",
            "timestamp": 1_700_000_000u64,
            "creator": "0xabc"
        }
    ]);
    ledger
        .set_data(MERGERS_SLOT, payload.to_string().as_bytes(), 0, &wallet.account())
        .await
        .expect("seed");

    let store = ProposalStore::new(ContractGateway::new(ledger.clone()));
    assert_eq!(store.refresh().await.expect("refresh"), 1);
    let record = store.get(1).await.expect("legacy record");
    assert_eq!(codec::decode(&record.treasury_encoded).expect("legacy"), 3.5);

    // A corrupted slot reads as an empty collection, not an error.
    ledger
        .set_data(MERGERS_SLOT, b"{not json", 1, &wallet.account())
        .await
        .expect("corrupt");
    assert_eq!(store.refresh().await.expect("refresh"), 0);
    assert!(store.is_empty().await);
}
