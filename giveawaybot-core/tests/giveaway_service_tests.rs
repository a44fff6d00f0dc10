// tests/giveaway_service_tests.rs

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use mockall::mock;
use giveawaybot_common::error::GiveawayError;
use giveawaybot_common::models::{GiveawayEntrant, GiveawayStatus, User};
use giveawaybot_core::Error;
use giveawaybot_core::repositories::{GiveawayRepository, UserRepository};
use giveawaybot_core::services::{GiveawayService, StreamSessionService, WatchTimeService};
use giveawaybot_core::services::activity::ActivitySignal;
use giveawaybot_core::test_utils::helpers::*;

mock! {
    pub Users {}
    #[async_trait]
    impl UserRepository for Users {
        async fn increment_watch_time(&self, user_id: &str, username: &str) -> Result<i64, Error>;
        async fn get_watch_time(&self, user_id: &str) -> Result<i64, Error>;
        async fn reset_all_watch_time(&self) -> Result<(), Error>;
        async fn get_user(&self, user_id: &str) -> Result<Option<User>, Error>;
    }
}

mock! {
    pub Giveaways {}
    #[async_trait]
    impl GiveawayRepository for Giveaways {
        async fn try_add_entrant(&self, key_name: &str, user_id: &str, username: &str) -> Result<bool, Error>;
        async fn list_entrants(&self, key_name: &str) -> Result<Vec<GiveawayEntrant>, Error>;
        async fn count_entrants(&self, key_name: &str) -> Result<i64, Error>;
        async fn clear_entrants(&self, key_name: &str) -> Result<u64, Error>;
    }
}

fn storage_down() -> Error {
    Error::Database(sqlx::Error::PoolTimedOut)
}

async fn service_with_threshold(min_watch_time: i64) -> (Arc<GiveawayService>, TestRepos) {
    let repos = setup_test_repos().await.expect("test db");
    let svc = GiveawayService::new(repos.giveaways.clone(), repos.users.clone(), min_watch_time);
    (Arc::new(svc), repos)
}

async fn give_ticks(repos: &TestRepos, user_id: &str, name: &str, n: usize) {
    for _ in 0..n {
        repos.users.increment_watch_time(user_id, name).await.unwrap();
    }
}

#[tokio::test]
async fn test_only_one_giveaway_open_at_a_time() {
    let (svc, _repos) = service_with_threshold(0).await;

    svc.open("k1").await.unwrap();
    assert!(matches!(svc.open("k1").await, Err(GiveawayError::AlreadyOpen(k)) if k == "k1"));
    assert!(matches!(svc.open("k2").await, Err(GiveawayError::AlreadyOpen(k)) if k == "k1"));
    assert_eq!(svc.current_key().await.as_deref(), Some("k1"));

    svc.close().await.unwrap();
    svc.open("k2").await.unwrap();
    assert_eq!(svc.current_key().await.as_deref(), Some("k2"));
}

#[tokio::test]
async fn test_join_without_open_giveaway_fails_regardless_of_eligibility() {
    let (svc, repos) = service_with_threshold(1).await;
    give_ticks(&repos, "1", "alice", 10).await;

    assert!(matches!(svc.join("1", "alice").await, Err(GiveawayError::NoActiveGiveaway)));
    assert!(matches!(svc.join("2", "bob").await, Err(GiveawayError::NoActiveGiveaway)));
    assert!(matches!(svc.close().await, Err(GiveawayError::NoActiveGiveaway)));
}

#[tokio::test]
async fn test_join_is_gated_and_unique() {
    let (svc, repos) = service_with_threshold(3).await;
    give_ticks(&repos, "1", "alice", 3).await;
    give_ticks(&repos, "2", "bob", 2).await;

    svc.open("k1").await.unwrap();

    assert_eq!(svc.join("1", "alice").await.unwrap(), "k1");
    assert!(matches!(svc.join("1", "alice").await, Err(GiveawayError::AlreadyEntered(k)) if k == "k1"));
    assert!(matches!(
        svc.join("2", "bob").await,
        Err(GiveawayError::Ineligible { required: 3, actual: 2 })
    ));
    assert!(matches!(
        svc.join("3", "stranger").await,
        Err(GiveawayError::Ineligible { required: 3, actual: 0 })
    ));

    assert_eq!(svc.entrant_count("k1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_close_reports_count_and_keeps_entrants() {
    let (svc, repos) = service_with_threshold(0).await;

    svc.open("k1").await.unwrap();
    svc.join("1", "alice").await.unwrap();
    svc.join("2", "bob").await.unwrap();

    let closed = svc.close().await.unwrap();
    assert_eq!(closed.key, "k1");
    assert_eq!(closed.entrant_count, 2);
    assert_eq!(svc.status().await, GiveawayStatus::Inactive);

    assert_eq!(repos.giveaways.count_entrants("k1").await.unwrap(), 2);
    let winner = svc.pick("k1").await.unwrap();
    assert!(winner.user_id == "1" || winner.user_id == "2");
}

#[tokio::test]
async fn test_reopening_a_key_starts_empty() {
    let (svc, _repos) = service_with_threshold(0).await;

    svc.open("k1").await.unwrap();
    svc.join("1", "alice").await.unwrap();
    svc.close().await.unwrap();

    svc.open("k1").await.unwrap();
    assert_eq!(svc.entrant_count("k1").await.unwrap(), 0);
    assert_eq!(svc.join("1", "alice").await.unwrap(), "k1");
}

#[tokio::test]
async fn test_status_reports_open_key_and_count() {
    let (svc, _repos) = service_with_threshold(0).await;
    assert_eq!(svc.status().await, GiveawayStatus::Inactive);

    svc.open("Key-1").await.unwrap();
    svc.join("1", "alice").await.unwrap();

    assert_eq!(
        svc.status().await,
        GiveawayStatus::Open { key: "Key-1".to_string(), entrant_count: Some(1) }
    );
}

#[tokio::test]
async fn test_pick_on_empty_set_fails() {
    let (svc, _repos) = service_with_threshold(0).await;
    assert!(matches!(svc.pick("never-opened").await, Err(GiveawayError::NoParticipants(k)) if k == "never-opened"));
}

#[tokio::test]
async fn test_pick_with_single_entrant_always_returns_it() {
    let (svc, _repos) = service_with_threshold(0).await;
    svc.open("solo").await.unwrap();
    svc.join("1", "alice").await.unwrap();

    for _ in 0..50 {
        assert_eq!(svc.pick("solo").await.unwrap().user_id, "1");
    }
    // Picking is a pure read.
    assert_eq!(svc.entrant_count("solo").await.unwrap(), 1);
    assert_eq!(svc.current_key().await.as_deref(), Some("solo"));
}

#[tokio::test]
async fn test_pick_works_for_keys_from_earlier_runs() {
    let (svc, repos) = service_with_threshold(0).await;
    repos.giveaways.try_add_entrant("old", "7", "grace").await.unwrap();

    let winner = svc.pick("old").await.unwrap();
    assert_eq!(winner.username, "grace");
    assert!(matches!(svc.pick("OLD").await, Err(GiveawayError::NoParticipants(_))));
}

#[tokio::test]
async fn test_pick_is_uniform() {
    let (svc, _repos) = service_with_threshold(0).await;
    svc.open("k").await.unwrap();
    for (id, name) in [("1", "a"), ("2", "b"), ("3", "c"), ("4", "d")] {
        svc.join(id, name).await.unwrap();
    }

    let trials = 4000;
    let mut hits: HashMap<String, usize> = HashMap::new();
    for _ in 0..trials {
        let w = svc.pick("k").await.unwrap();
        *hits.entry(w.user_id).or_default() += 1;
    }

    assert_eq!(hits.len(), 4, "every entrant should win at least once");
    let expected = trials / 4;
    for (id, n) in &hits {
        let deviation = (*n as f64 - expected as f64).abs() / expected as f64;
        assert!(deviation < 0.15, "entrant {} won {} of {} picks", id, n, trials);
    }
}

#[tokio::test]
async fn test_concurrent_joins_by_one_user_admit_once() {
    let (svc, _repos) = service_with_threshold(0).await;
    svc.open("k1").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move { svc.join("1", "alice").await }));
    }

    let mut ok = 0;
    let mut already = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(GiveawayError::AlreadyEntered(_)) => already += 1,
            Err(e) => panic!("unexpected error: {:?}", e),
        }
    }
    assert_eq!((ok, already), (1, 9));
    assert_eq!(svc.entrant_count("k1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_alice_and_bob_scenario() {
    let repos = setup_test_repos().await.unwrap();
    let watch_time = WatchTimeService::new(repos.users.clone());
    let sessions = StreamSessionService::new(repos.sessions.clone());
    let svc = GiveawayService::new(repos.giveaways.clone(), repos.users.clone(), 3);

    for _ in 0..5 {
        watch_time.record_activity(&ActivitySignal::new("alice", "alice")).await.unwrap();
    }
    for _ in 0..2 {
        watch_time.record_activity(&ActivitySignal::new("bob", "bob")).await.unwrap();
    }

    svc.open("key1").await.unwrap();
    assert_eq!(svc.join("alice", "alice").await.unwrap(), "key1");
    assert!(matches!(
        svc.join("bob", "bob").await,
        Err(GiveawayError::Ineligible { required: 3, actual: 2 })
    ));

    let closed = svc.close().await.unwrap();
    assert_eq!(closed.entrant_count, 1);
    assert_eq!(svc.pick("key1").await.unwrap().user_id, "alice");

    sessions.start_new_stream().await.unwrap();
    assert_eq!(watch_time.get_watch_time("alice").await.unwrap(), 0);
}

#[tokio::test]
async fn test_open_does_not_advance_when_store_fails() {
    let mut giveaways = MockGiveaways::new();
    giveaways.expect_clear_entrants().returning(|_| Err(storage_down()));
    let users = MockUsers::new();

    let svc = GiveawayService::new(Arc::new(giveaways), Arc::new(users), 0);

    assert!(matches!(svc.open("k1").await, Err(GiveawayError::StorageUnavailable(_))));
    assert_eq!(svc.status().await, GiveawayStatus::Inactive);
}

#[tokio::test]
async fn test_storage_failures_surface_as_storage_unavailable() {
    let mut giveaways = MockGiveaways::new();
    giveaways.expect_clear_entrants().returning(|_| Ok(0));
    giveaways.expect_count_entrants().returning(|_| Err(storage_down()));
    giveaways.expect_list_entrants().returning(|_| Err(storage_down()));
    let mut users = MockUsers::new();
    users.expect_get_watch_time().returning(|_| Err(storage_down()));

    let svc = GiveawayService::new(Arc::new(giveaways), Arc::new(users), 0);
    svc.open("k1").await.unwrap();

    assert!(matches!(svc.join("1", "alice").await, Err(GiveawayError::StorageUnavailable(_))));
    assert!(matches!(svc.pick("k1").await, Err(GiveawayError::StorageUnavailable(_))));

    // status never fails; it just loses the count.
    assert_eq!(
        svc.status().await,
        GiveawayStatus::Open { key: "k1".to_string(), entrant_count: None }
    );

    // close needs the count, so the giveaway stays open.
    assert!(matches!(svc.close().await, Err(GiveawayError::StorageUnavailable(_))));
    assert_eq!(svc.current_key().await.as_deref(), Some("k1"));
}
