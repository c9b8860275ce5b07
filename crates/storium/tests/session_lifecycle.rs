//! end-to-end session lifecycle against a scripted wallet

use proptest::prelude::*;
use std::sync::Arc;
use storium::provider::methods;
use storium::session::{ACCOUNT_KEY, CONNECTED_KEY};
use storium::testing::MockWallet;
use storium::{
    App, AppConfig, EventOutcome, KeyValueStore, MemoryStore, Phase, SledStore, View, WalletEvent,
};

const ALICE: &str = "0xAbC0000000000000000000000000000000000001";
const BOB: &str = "0xb0b0000000000000000000000000000000000002";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storium=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn persisted(account: &str) -> MemoryStore {
    let store = MemoryStore::new();
    store.set(CONNECTED_KEY, "true").unwrap();
    store.set(ACCOUNT_KEY, account).unwrap();
    store
}

fn app(wallet: &Arc<MockWallet>, store: &MemoryStore) -> App<MockWallet, MemoryStore> {
    App::new(AppConfig::sepolia(), Some(wallet.clone()), store.clone())
}

async fn connected_app(wallet: &Arc<MockWallet>, store: &MemoryStore) -> App<MockWallet, MemoryStore> {
    let mut app = app(wallet, store);
    app.init().await;
    app.enter();
    app.connect().await.unwrap();
    assert_eq!(app.phase(), Phase::Connected);
    app
}

#[tokio::test]
async fn test_fresh_visit_then_connect() {
    init_tracing();
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = MemoryStore::new();
    let mut app = app(&wallet, &store);
    let phases = app.subscribe_phase();

    assert_eq!(app.phase(), Phase::Uninitialized);
    assert!(matches!(app.view(), View::Loading));

    app.init().await;
    assert_eq!(app.phase(), Phase::LandingShown);
    assert_eq!(wallet.count(methods::REQUEST_ACCOUNTS), 0);

    app.enter();
    app.connect().await.unwrap();
    assert_eq!(app.phase(), Phase::Connected);
    assert_eq!(*phases.borrow(), Phase::Connected);

    // stored exactly as the wallet returned it
    assert_eq!(store.get(CONNECTED_KEY).unwrap().as_deref(), Some("true"));
    assert_eq!(store.get(ACCOUNT_KEY).unwrap().as_deref(), Some(ALICE));

    match app.view() {
        View::Dashboard { account, panel, network_error, .. } => {
            assert_eq!(account.as_str(), ALICE);
            assert!(panel.is_some());
            assert!(!network_error);
        }
        _ => panic!("expected dashboard"),
    }
}

#[tokio::test]
async fn test_reload_with_matching_session_reconnects_silently() {
    init_tracing();
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]).authorized());
    let store = persisted(ALICE);
    let mut app = app(&wallet, &store);

    app.init().await;
    assert_eq!(app.phase(), Phase::Connected);
    assert_eq!(app.account().unwrap().as_str(), ALICE);
    assert!(app.contract().is_some());
}

#[tokio::test]
async fn test_sled_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session");
    let store = SledStore::open(path.to_str().unwrap()).unwrap();
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));

    {
        let mut first = App::new(AppConfig::sepolia(), Some(wallet.clone()), store.clone());
        first.init().await;
        first.enter();
        first.connect().await.unwrap();
        first.teardown();
    }
    assert_eq!(store.get(ACCOUNT_KEY).unwrap().as_deref(), Some(ALICE));

    let mut second = App::new(AppConfig::sepolia(), Some(wallet.clone()), store.clone());
    second.init().await;
    assert_eq!(second.phase(), Phase::Connected);
    assert_eq!(second.account().unwrap().as_str(), ALICE);
}

#[tokio::test]
async fn test_reload_with_different_case_matches() {
    let wallet = Arc::new(
        MockWallet::new()
            .with_accounts(&["0xabc0000000000000000000000000000000000001"])
            .authorized(),
    );
    let store = persisted("0xABC0000000000000000000000000000000000001");
    let mut app = app(&wallet, &store);

    app.init().await;
    assert_eq!(app.phase(), Phase::Connected);
}

#[tokio::test]
async fn test_reload_with_other_account_discards_session() {
    let wallet = Arc::new(MockWallet::new().with_accounts(&[BOB]).authorized());
    let store = persisted(ALICE);
    let mut app = app(&wallet, &store);

    app.init().await;
    assert_eq!(app.phase(), Phase::LandingShown);
    assert!(app.account().is_none());
    assert!(store.is_empty());
    assert_eq!(wallet.count(methods::REQUEST_ACCOUNTS), 0);
}

#[tokio::test]
async fn test_reload_with_revoked_site_discards_session() {
    // wallet still has the account but the site lost its permission
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = persisted(ALICE);
    let mut app = app(&wallet, &store);

    app.init().await;
    assert_eq!(app.phase(), Phase::LandingShown);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_is_idempotent() {
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = MemoryStore::new();
    let mut app = connected_app(&wallet, &store).await;

    app.logout().await.unwrap();
    app.logout().await.unwrap();
    assert_eq!(app.phase(), Phase::LandingShown);
    assert!(store.is_empty());

    // also from a state that never connected
    let mut fresh = self::app(&wallet, &MemoryStore::new());
    fresh.logout().await.unwrap();
    fresh.logout().await.unwrap();
    assert_eq!(fresh.phase(), Phase::LandingShown);
}

#[tokio::test]
async fn test_empty_accounts_forces_landing() {
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = MemoryStore::new();
    let mut app = connected_app(&wallet, &store).await;

    let outcome = app.handle_event(WalletEvent::AccountsChanged(vec![])).await;
    assert_eq!(outcome, EventOutcome::Disconnected);
    assert_eq!(app.phase(), Phase::LandingShown);
    assert!(store.is_empty());
    assert!(app.account().is_none());
}

#[tokio::test]
async fn test_empty_accounts_from_network_mismatch() {
    let wallet = Arc::new(
        MockWallet::new()
            .with_chain("0x1")
            .with_accounts(&[ALICE])
            .fail_switch(storium::RpcError::user_rejected()),
    );
    let store = MemoryStore::new();
    let mut app = app(&wallet, &store);
    app.init().await;
    app.enter();
    assert!(app.connect().await.is_err());
    assert_eq!(app.phase(), Phase::NetworkMismatch);
    assert!(app.notice().is_some());

    app.handle_event(WalletEvent::AccountsChanged(vec![])).await;
    assert_eq!(app.phase(), Phase::LandingShown);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_account_switch_updates_session_and_reloads() {
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = MemoryStore::new();
    let mut app = connected_app(&wallet, &store).await;

    let outcome = app
        .handle_event(WalletEvent::AccountsChanged(vec![BOB.to_string()]))
        .await;
    assert_eq!(outcome, EventOutcome::Reload);
    assert_eq!(store.get(ACCOUNT_KEY).unwrap().as_deref(), Some(BOB));

    // same account in another casing is not a switch
    let outcome = app
        .handle_event(WalletEvent::AccountsChanged(vec![BOB.to_uppercase().replace("0X", "0x")]))
        .await;
    assert_eq!(outcome, EventOutcome::Ignored);

    // after the reload the wallet reports bob as active
    wallet.set_accounts(&[BOB]);
    app.reload().await;
    assert_eq!(app.phase(), Phase::Connected);
    assert_eq!(app.account().unwrap().as_str(), BOB);
}

#[tokio::test]
async fn test_account_change_without_session_is_ignored() {
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let mut app = app(&wallet, &MemoryStore::new());
    app.init().await;

    let outcome = app
        .handle_event(WalletEvent::AccountsChanged(vec![BOB.to_string()]))
        .await;
    assert_eq!(outcome, EventOutcome::Ignored);
    assert_eq!(app.phase(), Phase::LandingShown);
}

#[tokio::test]
async fn test_chain_change_rechecks_once_then_reloads() {
    for chain in ["0xaa36a7", "0x1"] {
        let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
        let store = MemoryStore::new();
        let mut app = connected_app(&wallet, &store).await;
        wallet.set_chain(chain);
        wallet.clear_calls();

        let outcome = app
            .handle_event(WalletEvent::ChainChanged(chain.to_string()))
            .await;
        assert_eq!(outcome, EventOutcome::Reload);
        assert_eq!(wallet.count(methods::CHAIN_ID), 1);
        assert_eq!(wallet.calls().len(), 1);
        assert_eq!(
            app.connection().guard().is_mismatched(),
            chain != "0xaa36a7"
        );
    }
}

#[tokio::test]
async fn test_run_loop_handles_notifications() {
    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = MemoryStore::new();
    let mut app = connected_app(&wallet, &store).await;

    wallet.emit(WalletEvent::ChainChanged("0xaa36a7".into()));
    wallet.emit(WalletEvent::AccountsChanged(vec![]));

    // drain what was queued, then stop
    while let Ok(Some(event)) =
        tokio::time::timeout(std::time::Duration::from_millis(10), app.next_event()).await
    {
        if app.handle_event(event).await == EventOutcome::Reload {
            app.reload().await;
        }
    }

    assert_eq!(app.phase(), Phase::LandingShown);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_chain_is_added_during_connect() {
    let wallet = Arc::new(
        MockWallet::new()
            .with_chain("0x89")
            .without_chain("0xaa36a7")
            .with_accounts(&[ALICE]),
    );
    let store = MemoryStore::new();
    let mut app = app(&wallet, &store);
    app.init().await;
    assert!(app.connection().guard().is_mismatched());

    app.enter();
    app.connect().await.unwrap();
    assert_eq!(wallet.count(methods::ADD_CHAIN), 1);
    assert!(!app.connection().guard().is_mismatched());
    assert_eq!(app.phase(), Phase::Connected);
}

fn address_with_case() -> impl Strategy<Value = (String, String)> {
    (
        proptest::collection::vec(0u8..16, 40),
        proptest::collection::vec(any::<bool>(), 40),
    )
        .prop_map(|(digits, upper)| {
            let lower: String = digits
                .iter()
                .map(|d| std::char::from_digit(*d as u32, 16).unwrap())
                .collect();
            let mixed: String = lower
                .chars()
                .zip(upper)
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                .collect();
            (format!("0x{}", lower), format!("0x{}", mixed))
        })
}

proptest! {
    #[test]
    fn prop_matching_session_always_reconnects((stored, active) in address_with_case()) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let wallet = Arc::new(MockWallet::new().with_accounts(&[active.as_str()]).authorized());
            let store = persisted(&stored);
            let mut app = app(&wallet, &store);
            app.init().await;
            prop_assert_eq!(app.phase(), Phase::Connected);
            Ok(())
        })?;
    }

    #[test]
    fn prop_foreign_account_never_connects((stored, _) in address_with_case(), (other, _) in address_with_case()) {
        prop_assume!(!stored.eq_ignore_ascii_case(&other));
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            let wallet = Arc::new(MockWallet::new().with_accounts(&[other.as_str()]).authorized());
            let store = persisted(&stored);
            let mut app = app(&wallet, &store);
            app.init().await;
            prop_assert_eq!(app.phase(), Phase::LandingShown);
            prop_assert!(app.account().is_none());
            prop_assert!(store.is_empty());
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_listing_on_wrong_chain_reaches_contract() {
    use alloy_sol_types::SolCall;
    use storium::abi::{FileEntry, IStorium};
    use storium::U256;

    let wallet = Arc::new(MockWallet::new().with_accounts(&[ALICE]));
    let store = MemoryStore::new();
    let mut app = connected_app(&wallet, &store).await;

    wallet.set_chain("0x1");
    app.handle_event(WalletEvent::ChainChanged("0x1".into())).await;
    assert!(app.connection().guard().is_mismatched());

    let size = U256::MAX;
    let entry = FileEntry {
        fileName: "archive.tar".into(),
        fileType: "application/x-tar".into(),
        ipfsHash: "QmArchive".into(),
        fileSize: size,
        uploadTime: U256::from(1_700_000_000u64),
        owner: storium::Address::parse(ALICE).unwrap().to_alloy(),
        isPublic: true,
        description: String::new(),
        tags: vec![],
    };
    let ret = IStorium::getPublicFilesCall::abi_encode_returns(&(vec![entry],));
    wallet.push_response(
        methods::CALL,
        Ok(serde_json::json!(format!("0x{}", hex::encode(ret)))),
    );

    let files = app.require_contract().unwrap().get_public_files().await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_size, size);
    assert_eq!(files[0].owner.as_str(), ALICE.to_lowercase());
}
