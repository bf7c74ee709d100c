mod common;

use attendance_core::gateway::{codes, AuthGateway};
use attendance_core::store::session::SessionStore;
use attendance_core::{AppContext, StoreError};
use common::{recording_gateway, start, PASSWORD};

#[tokio::test]
async fn context_hydrates_and_follows_session_changes() {
    let gateway = recording_gateway(false);
    let context = start(&gateway).await;

    let state = context.session().snapshot();
    assert!(!state.loading);
    assert!(state.session.is_none());

    context
        .session()
        .sign_up("new@example.com", PASSWORD, "EE-001")
        .await
        .unwrap();
    let session = context.session().session().unwrap();
    assert_eq!(session.user.email, "new@example.com");

    let profile = context.session().profile().await.unwrap().unwrap();
    assert_eq!(profile.id, session.user.id);
    assert_eq!(profile.roll_number, "EE-001");

    context.session().sign_out().await.unwrap();
    assert!(!context.session().is_signed_in());
    assert_eq!(context.session().profile().await.unwrap(), None);

    context
        .session()
        .sign_in("new@example.com", PASSWORD)
        .await
        .unwrap();
    assert!(context.session().is_signed_in());
}

#[tokio::test]
async fn restarted_context_picks_up_existing_session() {
    let gateway = recording_gateway(false);
    gateway.sign_up("keep@example.com", PASSWORD).await.unwrap();

    let context = start(&gateway).await;
    assert_eq!(gateway.calls("get_session"), 1);
    assert_eq!(
        context.session().session().map(|s| s.user.email),
        Some("keep@example.com".to_string())
    );
}

#[tokio::test]
async fn sign_in_alone_does_not_touch_state() {
    let gateway = recording_gateway(false);
    gateway.sign_up("solo@example.com", PASSWORD).await.unwrap();
    gateway.sign_out().await.unwrap();

    // A bare store has no gateway subscription feeding it.
    let store = SessionStore::new(gateway.clone());
    let before = store.snapshot();
    assert!(before.loading);

    store.sign_in("solo@example.com", PASSWORD).await.unwrap();
    assert_eq!(store.snapshot(), before);
    assert!(gateway.get_session().await.unwrap().is_some());
}

#[tokio::test]
async fn sign_in_failure_is_returned_verbatim() {
    let gateway = recording_gateway(false);
    let context = start(&gateway).await;

    let err = context
        .session()
        .sign_in("ghost@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid login credentials");
    assert!(err
        .gateway_error()
        .unwrap()
        .has_code(codes::INVALID_CREDENTIALS));
    assert!(!context.session().is_signed_in());
}

async fn register_first(context: &AppContext) {
    context
        .session()
        .sign_up("first@example.com", PASSWORD, "ME-001")
        .await
        .unwrap();
    context.session().sign_out().await.unwrap();
}

#[tokio::test]
async fn failed_identity_insert_rolls_back_account() {
    let gateway = recording_gateway(true);
    let context = start(&gateway).await;
    register_first(&context).await;

    let err = context
        .session()
        .sign_up("second@example.com", PASSWORD, "ME-001")
        .await
        .unwrap_err();

    let original = err.gateway_error().unwrap();
    assert!(original.has_code(codes::UNIQUE_VIOLATION));
    assert!(matches!(err, StoreError::Gateway(_)));
    assert_eq!(gateway.calls("admin_delete_user"), 1);
    assert!(!context.session().is_signed_in());

    let sign_in = gateway
        .sign_in_with_password("second@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert!(sign_in.has_code(codes::INVALID_CREDENTIALS));
}

#[tokio::test]
async fn rollback_without_privileges_is_reported_distinctly() {
    let gateway = recording_gateway(false);
    let context = start(&gateway).await;
    register_first(&context).await;

    let err = context
        .session()
        .sign_up("orphan@example.com", PASSWORD, "ME-001")
        .await
        .unwrap_err();

    match &err {
        StoreError::CompensationFailed {
            original,
            compensation,
        } => {
            assert!(original.has_code(codes::UNIQUE_VIOLATION));
            assert!(compensation.has_code(codes::NOT_ADMIN));
            assert_eq!(err.to_string(), original.to_string());
        }
        other => panic!("expected compensation failure, got {other:?}"),
    }
    // The orphaned account still exists and is signed in.
    assert!(context.session().is_signed_in());
}

#[tokio::test]
async fn sign_up_validation_errors_skip_identity_insert() {
    let gateway = recording_gateway(true);
    let context = start(&gateway).await;

    let err = context
        .session()
        .sign_up("weak@example.com", "123", "ME-002")
        .await
        .unwrap_err();
    assert!(err.gateway_error().unwrap().has_code(codes::WEAK_PASSWORD));
    assert_eq!(gateway.calls("insert_profile"), 0);
    assert_eq!(gateway.calls("admin_delete_user"), 0);
}

#[tokio::test]
async fn gateway_keeps_working_after_contexts_end() {
    let gateway = recording_gateway(false);
    start(&gateway).await.shutdown();
    drop(start(&gateway).await);

    gateway.sign_up("after@example.com", PASSWORD).await.unwrap();
    assert!(gateway.get_session().await.unwrap().is_some());
    assert_eq!(gateway.calls("on_session_change"), 2);
}
