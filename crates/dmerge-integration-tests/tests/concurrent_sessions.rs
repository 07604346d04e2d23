//! Integration test: two sessions writing the same slot.
//!
//! Both sessions read the collection at the same version. The first write
//! wins outright; the second hits a version conflict, re-reads, and lands
//! as id 2. Neither record is lost.

use std::sync::Arc;

use dmerge_gateway::{ContractGateway, Ledger, LocalWallet, MemoryLedger, SqliteLedger, Wallet};
use dmerge_integration_tests::TEST_CONTRACT;
use dmerge_store::{ProposalStore, StoreError};
use dmerge_types::{WorkflowState, MERGERS_SLOT};

async fn two_sessions_from_same_base(ledger: Arc<dyn Ledger>) {
    let alice = ProposalStore::new(ContractGateway::new(ledger.clone()));
    let bob = ProposalStore::new(ContractGateway::new(ledger.clone()));
    alice.refresh().await.expect("alice refresh");
    bob.refresh().await.expect("bob refresh");

    let alice_wallet: Arc<dyn Wallet> = Arc::new(LocalWallet::generate());
    let bob_wallet: Arc<dyn Wallet> = Arc::new(LocalWallet::generate());

    let first = alice
        .create("Alpha", 10.0, 5.0, Some(alice_wallet.clone()))
        .await
        .expect("alice create");
    let second = bob
        .create("Beta", 20.0, 7.0, Some(bob_wallet.clone()))
        .await
        .expect("bob create after retry");
    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);

    let slot = ledger.get_data(MERGERS_SLOT).await.expect("slot");
    assert_eq!(slot.version, 2);
    let records = dmerge_store::parse_records(&slot.bytes);
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Beta"]);
    assert_eq!(records[1].creator, bob_wallet.account());

    // Alice's cache is stale until she refreshes.
    assert_eq!(alice.len().await, 1);
    alice.refresh().await.expect("alice refresh");
    assert_eq!(alice.len().await, 2);
    assert_eq!(bob.len().await, 2);
}

#[tokio::test]
async fn conflicting_creates_both_persist_in_memory() {
    two_sessions_from_same_base(Arc::new(MemoryLedger::new(TEST_CONTRACT))).await;
}

#[tokio::test]
async fn conflicting_creates_both_persist_in_sqlite() {
    let ledger = SqliteLedger::open_memory(TEST_CONTRACT).expect("open");
    two_sessions_from_same_base(Arc::new(ledger)).await;
}

#[tokio::test]
async fn conflict_without_retries_surfaces() {
    let ledger: Arc<dyn Ledger> = Arc::new(MemoryLedger::new(TEST_CONTRACT));
    let alice = ProposalStore::new(ContractGateway::new(ledger.clone()));
    let bob = ProposalStore::new(ContractGateway::new(ledger.clone())).with_max_write_retries(0);
    alice.refresh().await.expect("refresh");
    bob.refresh().await.expect("refresh");

    alice
        .create("Alpha", 1.0, 1.0, Some(Arc::new(LocalWallet::generate())))
        .await
        .expect("alice create");
    let err = bob
        .create("Beta", 1.0, 1.0, Some(Arc::new(LocalWallet::generate())))
        .await
        .expect_err("bob must conflict");
    assert!(matches!(err, StoreError::Transaction(dmerge_gateway::TransactionCause::Conflict { .. })));
    assert!(bob.is_empty().await, "failed save leaves the cache unchanged");
    assert!(matches!(bob.create_workflow().current(), WorkflowState::Failed(_)));
}

#[tokio::test]
async fn parallel_creates_from_many_sessions() {
    let ledger: Arc<dyn Ledger> = Arc::new(MemoryLedger::new(TEST_CONTRACT));
    let mut handles = Vec::new();
    for i in 0..3 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let store = ProposalStore::new(ContractGateway::new(ledger));
            store.refresh().await.expect("refresh");
            let wallet: Arc<dyn Wallet> = Arc::new(LocalWallet::generate());
            store
                .create(&format!("DAO {i}"), 1.0, 1.0, Some(wallet))
                .await
                .expect("create within retry budget")
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.expect("join").id);
    }
    ids.sort_unstable();
    assert_eq!(ids, [1, 2, 3]);

    let slot = ledger.get_data(MERGERS_SLOT).await.expect("slot");
    assert_eq!(dmerge_store::parse_records(&slot.bytes).len(), 3);
}
