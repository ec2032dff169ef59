//! Store and harness behaviour under a multi-threaded runtime.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Barrier;

use docguard_core::{AuthContext, BypassContext, Caller, DocGuardError, DocPath, Document};
use docguard_emulator::app_state::AppState;
use docguard_emulator::config::EmulatorConfig;
use docguard_emulator::harness::suite::{MY_EMAIL, MY_ID, THEIR_EMAIL, THEIR_ID};
use docguard_emulator::store::{DocumentStore, MemoryStore};

fn doc(v: serde_json::Value) -> Document {
    Document::try_from(v).unwrap()
}

fn me() -> AuthContext {
    Caller::user(MY_ID, MY_EMAIL).into()
}

fn them() -> AuthContext {
    Caller::user(THEIR_ID, THEIR_EMAIL).into()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_create_and_set_cannot_both_succeed() {
    let path = DocPath::new("todos", "x").unwrap();
    for _ in 0..2_000 {
        let store = Arc::new(MemoryStore::with_default_rules());
        let start = Arc::new(Barrier::new(2));

        let create = tokio::spawn({
            let (store, start, path) = (Arc::clone(&store), Arc::clone(&start), path.clone());
            async move {
                start.wait().await;
                store
                    .create(&them(), &path, doc(json!({ "uid": THEIR_ID })))
                    .await
            }
        });
        let set = tokio::spawn({
            let (store, start, path) = (Arc::clone(&store), Arc::clone(&start), path.clone());
            async move {
                start.wait().await;
                store.set(&me(), &path, doc(json!({ "uid": MY_ID }))).await
            }
        });

        let created = create.await.unwrap();
        let overwritten = set.await.unwrap();
        assert!(
            !(created.is_ok() && overwritten.is_ok()),
            "both writers succeeded on one document"
        );

        let bypass = AuthContext::Bypass(BypassContext::fixture_setup());
        let stored = store.get(&bypass, &path).await.unwrap().unwrap();
        let owner = stored.str_field("uid");
        if created.is_ok() {
            assert_eq!(owner, Some(THEIR_ID), "created todo changed owner");
        } else {
            assert_eq!(owner, Some(MY_ID));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_update_does_not_resurrect_deleted_document() {
    let path = DocPath::new("todos", "gone").unwrap();
    let bypass = AuthContext::Bypass(BypassContext::fixture_setup());
    for _ in 0..2_000 {
        let store = Arc::new(MemoryStore::with_default_rules());
        store
            .set(&bypass, &path, doc(json!({ "uid": MY_ID })))
            .await
            .unwrap();
        let start = Arc::new(Barrier::new(2));

        let delete = tokio::spawn({
            let (store, start, path) = (Arc::clone(&store), Arc::clone(&start), path.clone());
            async move {
                start.wait().await;
                store.delete(&me(), &path).await
            }
        });
        let update = tokio::spawn({
            let (store, start, path) = (Arc::clone(&store), Arc::clone(&start), path.clone());
            async move {
                start.wait().await;
                store.update(&me(), &path, doc(json!({ "name": "late" }))).await
            }
        });

        delete.await.unwrap().unwrap();
        let updated = update.await.unwrap();
        let stored = store.get(&bypass, &path).await.unwrap();
        // either the update landed first and was then deleted, or it saw nothing
        assert!(stored.is_none());
        if let Err(e) = updated {
            assert_eq!(e.code().as_str(), "NOT_FOUND");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn harnesses_over_one_store_take_turns() {
    let state = AppState::new(EmulatorConfig::default()).unwrap();
    let first = state.harness();
    let second = state.harness().with_timeout(Duration::from_secs(5));

    let seeded = first.scenario("seeds and waits", |h| async move {
        let admin = h.as_admin();
        admin
            .doc("todos", "fixture")
            .set(json!({ "uid": MY_ID }))
            .await?;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let still_there = admin.doc("todos", "fixture").get().await?;
        assert!(still_there.is_some(), "fixture wiped by another scenario");
        Ok::<(), DocGuardError>(())
    });
    let other = async {
        // let the first scenario take the lock and seed
        tokio::time::sleep(Duration::from_millis(50)).await;
        second
            .scenario("runs alongside", |h| async move {
                let leftover = h.as_admin().doc("todos", "fixture").get().await?;
                assert!(leftover.is_none(), "previous scenario state leaked");
                Ok::<(), DocGuardError>(())
            })
            .await
    };

    let (a, b) = tokio::join!(seeded, other);
    a.unwrap();
    b.unwrap();
    assert!(state.store().is_empty());
}
