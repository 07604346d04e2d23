//! Per-session state: connected wallet, view model, status banner and
//! busy flags.
//!
//! The lock guarding the view is never held across a gateway or signature
//! call. Reveal results are applied only if the detail view that started
//! them is still open.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dmerge_gateway::Wallet;
use dmerge_reveal::{DetailView, PendingReveal, RevealOutcome, Toggle};
use dmerge_types::events::EventType;
use dmerge_types::view::ViewState;
use dmerge_types::{AccountId, BannerStatus, ProposalDraft, ProposalRecord, RevealField, StatusBanner, Tab};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::events::EventBus;

/// How long banners stay visible before auto-hiding.
#[derive(Debug, Clone, Copy)]
pub struct BannerTiming {
    pub success: Duration,
    pub error: Duration,
}

impl Default for BannerTiming {
    fn default() -> Self {
        Self {
            success: Duration::from_secs(2),
            error: Duration::from_secs(3),
        }
    }
}

/// Controls that reject re-entrant triggers while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Busy {
    Refreshing,
    Creating,
    Decrypting,
}

/// Clears its busy flag on drop.
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Partial update of the create-modal form.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct DraftPatch {
    pub name: Option<String>,
    pub treasury: Option<String>,
    pub activity: Option<String>,
}

#[derive(Default)]
struct ViewModel {
    active_tab: Tab,
    show_create_modal: bool,
    draft: ProposalDraft,
    detail: Option<DetailView>,
    banner: StatusBanner,
}

pub struct Session {
    wallet: RwLock<Option<Arc<dyn Wallet>>>,
    view: RwLock<ViewModel>,
    banner_generation: AtomicU64,
    timing: BannerTiming,
    refreshing: AtomicBool,
    creating: AtomicBool,
    decrypting: AtomicBool,
    events: EventBus,
}

impl Session {
    pub fn new(events: EventBus, timing: BannerTiming) -> Self {
        Self {
            wallet: RwLock::new(None),
            view: RwLock::new(ViewModel::default()),
            banner_generation: AtomicU64::new(0),
            timing,
            refreshing: AtomicBool::new(false),
            creating: AtomicBool::new(false),
            decrypting: AtomicBool::new(false),
            events,
        }
    }

    // Wallet

    pub async fn wallet(&self) -> Option<Arc<dyn Wallet>> {
        self.wallet.read().await.clone()
    }

    pub async fn account(&self) -> Option<AccountId> {
        self.wallet.read().await.as_ref().map(|w| w.account())
    }

    /// Connect a wallet, replacing any previous one.
    pub async fn connect(&self, wallet: Arc<dyn Wallet>) -> AccountId {
        let account = wallet.account();
        *self.wallet.write().await = Some(wallet);
        info!(account = %account, "wallet connected");
        self.events
            .publish(EventType::WalletConnected, serde_json::json!({ "account": account }));
        account
    }

    /// Returns `false` if no wallet was connected.
    pub async fn disconnect(&self) -> bool {
        let previous = self.wallet.write().await.take();
        match previous {
            Some(wallet) => {
                info!(account = %wallet.account(), "wallet disconnected");
                self.events.publish(
                    EventType::WalletDisconnected,
                    serde_json::json!({ "account": wallet.account() }),
                );
                true
            }
            None => false,
        }
    }

    // Busy flags

    /// Claim a busy flag. `None` if the control is already running.
    pub fn try_begin(&self, busy: Busy) -> Option<BusyGuard<'_>> {
        let flag = self.flag(busy);
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard { flag })
    }

    pub fn is_busy(&self, busy: Busy) -> bool {
        self.flag(busy).load(Ordering::SeqCst)
    }

    fn flag(&self, busy: Busy) -> &AtomicBool {
        match busy {
            Busy::Refreshing => &self.refreshing,
            Busy::Creating => &self.creating,
            Busy::Decrypting => &self.decrypting,
        }
    }

    // View

    /// Snapshot of the view for rendering.
    pub async fn view(&self) -> ViewState {
        let view = self.view.read().await;
        let cache = view.detail.as_ref().map(|d| d.cache()).unwrap_or_default();
        ViewState {
            active_tab: view.active_tab,
            show_create_modal: view.show_create_modal,
            draft: view.draft.clone(),
            selected: view.detail.as_ref().map(|d| d.record().id),
            decrypted_treasury: cache.treasury,
            decrypted_activity: cache.activity,
            banner: view.banner.clone(),
            refreshing: self.is_busy(Busy::Refreshing),
            creating: self.is_busy(Busy::Creating),
            decrypting: self.is_busy(Busy::Decrypting),
        }
    }

    pub async fn set_tab(&self, tab: Tab) {
        self.view.write().await.active_tab = tab;
        self.view_changed().await;
    }

    pub async fn set_create_modal(&self, open: bool) {
        self.view.write().await.show_create_modal = open;
        self.view_changed().await;
    }

    pub async fn update_draft(&self, patch: DraftPatch) -> ProposalDraft {
        let draft = {
            let mut view = self.view.write().await;
            if let Some(name) = patch.name {
                view.draft.name = name;
            }
            if let Some(treasury) = patch.treasury {
                view.draft.treasury = treasury;
            }
            if let Some(activity) = patch.activity {
                view.draft.activity = activity;
            }
            view.draft.clone()
        };
        self.view_changed().await;
        draft
    }

    pub async fn draft(&self) -> ProposalDraft {
        self.view.read().await.draft.clone()
    }

    /// Close the create modal and clear its form.
    pub async fn finish_create(&self) {
        {
            let mut view = self.view.write().await;
            view.show_create_modal = false;
            view.draft = ProposalDraft::default();
        }
        self.view_changed().await;
    }

    /// Open the detail view for `record`, discarding any previous reveals.
    pub async fn select(&self, record: ProposalRecord) {
        self.view.write().await.detail = Some(DetailView::open(record));
        self.view_changed().await;
    }

    /// Close the detail view. Returns `false` if none was open.
    pub async fn close_detail(&self) -> bool {
        let closed = self.view.write().await.detail.take().is_some();
        if closed {
            self.view_changed().await;
        }
        closed
    }

    pub async fn detail(&self) -> Option<DetailView> {
        self.view.read().await.detail.clone()
    }

    /// Start toggling `field` of the open record. Hiding completes here;
    /// a reveal comes back as a [`PendingReveal`] to sign outside the lock.
    /// `None` if no record is open.
    pub async fn begin_toggle(&self, field: RevealField) -> Option<(u64, Toggle)> {
        let started = {
            let mut view = self.view.write().await;
            view.detail
                .as_mut()
                .map(|detail| (detail.record().id, detail.begin_toggle(field)))
        };
        if matches!(started, Some((_, Toggle::Hidden))) {
            self.view_changed().await;
        }
        started
    }

    /// Record a decode result if the view that started `pending` is still
    /// open. Closing or reopening the detail view in between drops it.
    pub async fn finish_reveal(&self, pending: &PendingReveal, decoded: Option<f64>) -> Option<RevealOutcome> {
        let outcome = {
            let mut view = self.view.write().await;
            view.detail
                .as_mut()
                .and_then(|detail| detail.finish(pending, decoded))
        };
        match outcome {
            Some(_) => self.view_changed().await,
            None => debug!(field = ?pending.field(), "detail view changed during reveal, result dropped"),
        }
        outcome
    }

    // Banner

    pub async fn banner(&self) -> StatusBanner {
        self.view.read().await.banner.clone()
    }

    /// Show a banner. Success and error banners auto-hide after their
    /// configured time unless a newer banner replaced them first.
    pub async fn show_banner(self: &Arc<Self>, status: BannerStatus, message: impl Into<String>) {
        let banner = StatusBanner::shown(status, message);
        let generation = {
            let mut view = self.view.write().await;
            view.banner = banner.clone();
            self.publish_banner(&banner);
            self.banner_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let ttl = match status {
            BannerStatus::Success => self.timing.success,
            BannerStatus::Error => self.timing.error,
            BannerStatus::Pending => return,
        };
        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            session.expire_banner(generation).await;
        });
    }

    async fn expire_banner(&self, generation: u64) {
        let mut view = self.view.write().await;
        if self.banner_generation.load(Ordering::SeqCst) != generation {
            return;
        }
        view.banner = StatusBanner::hidden();
        self.publish_banner(&view.banner);
    }

    fn publish_banner(&self, banner: &StatusBanner) {
        self.events.publish(
            EventType::BannerChanged,
            serde_json::to_value(banner).unwrap_or_default(),
        );
    }

    async fn view_changed(&self) {
        let view = self.view().await;
        self.events
            .publish(EventType::ViewChanged, serde_json::to_value(view).unwrap_or_default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dmerge_crypto::codec;
    use dmerge_gateway::LocalWallet;

    fn session() -> Arc<Session> {
        Arc::new(Session::new(EventBus::new(64), BannerTiming::default()))
    }

    fn record(id: u64) -> ProposalRecord {
        ProposalRecord {
            id,
            name: format!("DAO {id}"),
            treasury_encoded: codec::encode(10.0),
            activity_encoded: codec::encode(5.0),
            valuation_encoded: codec::encode(0.0),
            created_at: 1_700_000_000,
            creator: "0xabc".into(),
        }
    }

    #[tokio::test]
    async fn test_busy_flag_rejects_reentry() {
        let s = session();
        let guard = s.try_begin(Busy::Creating).expect("first claim");
        assert!(s.try_begin(Busy::Creating).is_none());
        assert!(s.try_begin(Busy::Refreshing).is_some());
        assert!(s.view().await.creating);
        drop(guard);
        assert!(!s.is_busy(Busy::Creating));
        assert!(s.try_begin(Busy::Creating).is_some());
    }

    #[tokio::test]
    async fn test_wallet_connect_disconnect() {
        let s = session();
        assert!(s.account().await.is_none());
        assert!(!s.disconnect().await);
        let wallet = Arc::new(LocalWallet::generate());
        let account = s.connect(wallet).await;
        assert_eq!(s.account().await, Some(account));
        assert!(s.disconnect().await);
        assert!(s.wallet().await.is_none());
    }

    #[tokio::test]
    async fn test_draft_and_modal() {
        let s = session();
        s.set_create_modal(true).await;
        let draft = s
            .update_draft(DraftPatch {
                name: Some("Acme DAO".into()),
                treasury: Some("10".into()),
                ..Default::default()
            })
            .await;
        assert!(!draft.is_submittable());
        let draft = s
            .update_draft(DraftPatch {
                activity: Some("5".into()),
                ..Default::default()
            })
            .await;
        assert!(draft.is_submittable());

        s.finish_create().await;
        let view = s.view().await;
        assert!(!view.show_create_modal);
        assert_eq!(view.draft, ProposalDraft::default());
    }

    async fn begin_reveal(s: &Session, field: RevealField) -> PendingReveal {
        match s.begin_toggle(field).await {
            Some((_, Toggle::Reveal(pending))) => pending,
            other => unreachable!("expected a pending reveal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reveal_applies_only_to_open_record() {
        let s = session();
        assert!(s.begin_toggle(RevealField::Treasury).await.is_none());

        s.select(record(1)).await;
        let pending = begin_reveal(&s, RevealField::Treasury).await;
        assert_eq!(
            s.finish_reveal(&pending, Some(10.0)).await,
            Some(RevealOutcome::Revealed(10.0))
        );
        assert_eq!(s.view().await.decrypted_treasury, Some(10.0));

        let pending = begin_reveal(&s, RevealField::Activity).await;
        s.select(record(2)).await;
        assert_eq!(s.view().await.decrypted_treasury, None);
        assert_eq!(s.finish_reveal(&pending, Some(5.0)).await, None);
        assert_eq!(s.view().await.decrypted_activity, None);

        assert!(s.close_detail().await);
        assert_eq!(s.view().await.selected, None);
    }

    #[tokio::test]
    async fn test_reveal_dropped_when_same_record_reopened() {
        let s = session();
        s.select(record(1)).await;
        let pending = begin_reveal(&s, RevealField::Treasury).await;

        assert!(s.close_detail().await);
        s.select(record(1)).await;
        assert_eq!(s.finish_reveal(&pending, Some(10.0)).await, None);
        assert_eq!(s.view().await.selected, Some(1));
        assert_eq!(s.view().await.decrypted_treasury, None);
    }

    #[tokio::test]
    async fn test_toggle_hides_shown_field() {
        let s = session();
        s.select(record(1)).await;
        let pending = begin_reveal(&s, RevealField::Activity).await;
        s.finish_reveal(&pending, Some(5.0)).await;

        let hidden = s.begin_toggle(RevealField::Activity).await;
        assert_eq!(hidden, Some((1, Toggle::Hidden)));
        assert_eq!(s.view().await.decrypted_activity, None);
    }

    #[tokio::test]
    async fn test_concurrent_banners_keep_generation_order() {
        let s = session();
        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let s = Arc::clone(&s);
                tokio::spawn(async move { s.show_banner(BannerStatus::Success, format!("banner {i}")).await })
            })
            .collect();
        for task in tasks {
            task.await.expect("banner task");
        }
        // The banner on screen is always the one holding the newest
        // generation, so its timer is the one that can hide it.
        let shown = s.banner().await;
        assert!(shown.visible);
        let latest = s.banner_generation.load(Ordering::SeqCst);
        s.expire_banner(latest).await;
        assert!(!s.banner().await.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_auto_hides() {
        let s = session();
        s.show_banner(BannerStatus::Success, "Merger created successfully!").await;
        assert!(s.banner().await.visible);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(s.banner().await, StatusBanner::hidden());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_banner_supersedes_timer() {
        let s = session();
        s.show_banner(BannerStatus::Success, "Contract is available!").await;
        tokio::time::sleep(Duration::from_millis(1000)).await;
        s.show_banner(BannerStatus::Error, "Failed to load data").await;

        // The success timer fires at 2 s but must not hide the error banner.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let banner = s.banner().await;
        assert!(banner.visible);
        assert_eq!(banner.message, "Failed to load data");

        // Error banner expires 3 s after it was shown.
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert!(!s.banner().await.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_banner_stays() {
        let s = session();
        s.show_banner(BannerStatus::Pending, "Creating merger...").await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(s.banner().await.visible);
    }
}
