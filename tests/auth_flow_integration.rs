//! End-to-end scenarios for the session → role → route pipeline.
//!
//! Each scenario wires the real application components to the in-memory
//! adapters and drives them through the public API only.

use std::sync::Arc;
use std::time::Duration;

use personal_blog::adapters::auth::MockAuthClient;
use personal_blog::adapters::profile::InMemoryProfileStore;
use personal_blog::application::{
    AuthContext, BackgroundTasks, RoleResolver, RouteGuard, RouteTable, View, ViewRouter,
    LOGIN_PATH,
};
use personal_blog::domain::auth::{AuthChangeEvent, AuthState, GuardState, Role};
use personal_blog::ports::{CredentialAuth, Credentials, ProfileStoreError, SessionSource};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    client: Arc<MockAuthClient>,
    store: Arc<InMemoryProfileStore>,
    background: Arc<BackgroundTasks>,
    context: AuthContext,
    guard: RouteGuard,
}

impl Harness {
    fn start(client: MockAuthClient, store: InMemoryProfileStore) -> Self {
        let client = Arc::new(client);
        let store = Arc::new(store);
        let background = Arc::new(BackgroundTasks::new());
        let source: Arc<dyn SessionSource> = client.clone();

        let context = AuthContext::start(
            source.clone(),
            RoleResolver::new(store.clone(), background.clone()),
        );
        let guard = RouteGuard::start(source, LOGIN_PATH);

        Self {
            client,
            store,
            background,
            context,
            guard,
        }
    }

    async fn wait_for(&self, what: &str, check: impl Fn(&AuthState) -> bool) -> AuthState {
        let mut rx = self.context.subscribe();
        let state = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| check(s)))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
            .expect("auth context stopped")
            .clone();
        state
    }

    async fn wait_for_guard(&self, expected: GuardState) {
        let mut rx = self.guard.subscribe();
        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| *s == expected))
            .await
            .expect("guard never reached expected state")
            .expect("guard stopped");
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn scenario_a_no_session_is_anonymous_and_unauthenticated() {
    let h = Harness::start(MockAuthClient::new(), InMemoryProfileStore::new());

    let state = h.context.ready().await;
    assert!(state.session.is_none());
    assert_eq!(state.role, Role::Anonymous);
    assert!(!state.loading());

    assert_eq!(h.guard.settled().await, GuardState::Unauthenticated);
    assert_eq!(h.store.find_count(), 0);
}

#[tokio::test]
async fn scenario_b_admin_profile_unlocks_admin_routes() {
    let h = Harness::start(
        MockAuthClient::new().with_test_session("u1"),
        InMemoryProfileStore::new().with_profile("u1", Role::Admin),
    );

    let state = h.context.ready().await;
    assert_eq!(state.role, Role::Admin);
    assert!(RouteTable::for_role(state.role).contains("/admin"));
    assert_eq!(
        ViewRouter::route(state.role, true, "/admin/posts"),
        View::AdminPosts
    );
    assert_eq!(h.guard.settled().await, GuardState::Authenticated);
}

#[tokio::test]
async fn scenario_c_new_user_gets_profile_created() {
    let h = Harness::start(
        MockAuthClient::new().with_test_session("u2"),
        InMemoryProfileStore::new(),
    );

    let state = h.context.ready().await;
    assert_eq!(state.role, Role::User);

    h.background.drain().await;
    assert_eq!(h.store.insert_count(), 1);
    let row = h.store.get("u2").expect("profile row created");
    assert_eq!(row.role, "user");
    assert!(!RouteTable::for_role(state.role).contains("/admin"));
}

#[tokio::test]
async fn scenario_c_failed_insert_still_resolves_user() {
    let h = Harness::start(
        MockAuthClient::new().with_test_session("u2"),
        InMemoryProfileStore::new().with_insert_error(ProfileStoreError::unavailable("down")),
    );

    assert_eq!(h.context.ready().await.role, Role::User);
    h.background.drain().await;
    assert_eq!(h.store.insert_count(), 1);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn scenario_d_sign_out_drops_to_anonymous() {
    let h = Harness::start(
        MockAuthClient::new().with_test_session("u1"),
        InMemoryProfileStore::new().with_profile("u1", Role::Admin),
    );
    assert_eq!(h.context.ready().await.role, Role::Admin);
    assert_eq!(h.guard.settled().await, GuardState::Authenticated);

    h.client.emit(AuthChangeEvent::SignedOut, None);

    let state = h
        .wait_for("signed-out state", |s| s.session.is_none() && s.is_ready())
        .await;
    assert_eq!(state.role, Role::Anonymous);
    h.wait_for_guard(GuardState::Unauthenticated).await;
    assert_eq!(
        ViewRouter::route(state.role, false, "/admin"),
        View::NotFound
    );
}

// =============================================================================
// Credential flows
// =============================================================================

#[tokio::test]
async fn sign_in_flows_through_to_role() {
    let h = Harness::start(
        MockAuthClient::new().with_account("editor@example.com", "hunter22", "editor"),
        InMemoryProfileStore::new().with_profile("editor", Role::Admin),
    );
    h.context.ready().await;
    h.guard.settled().await;

    h.client
        .sign_in_with_credentials(&Credentials::new("editor@example.com", "hunter22"))
        .await
        .expect("sign-in accepted");

    let state = h
        .wait_for("admin role", |s| s.role == Role::Admin && s.is_ready())
        .await;
    assert_eq!(state.session.unwrap().user_id().as_str(), "editor");
    h.wait_for_guard(GuardState::Authenticated).await;
}

#[tokio::test]
async fn sign_up_creates_profile_on_first_resolution() {
    let h = Harness::start(MockAuthClient::new(), InMemoryProfileStore::new());
    h.context.ready().await;

    let session = h
        .client
        .sign_up_with_credentials(&Credentials::new("new@example.com", "pw-123456"))
        .await
        .unwrap()
        .expect("session issued without confirmation");

    h.wait_for("user role", |s| s.session.is_some() && s.is_ready())
        .await;
    h.background.drain().await;

    let row = h.store.get(session.user_id().as_str()).expect("profile row");
    assert_eq!(row.email.as_deref(), Some("new@example.com"));
}

#[tokio::test]
async fn teardown_releases_both_listeners() {
    let h = Harness::start(MockAuthClient::new(), InMemoryProfileStore::new());
    h.context.ready().await;
    h.guard.settled().await;
    assert_eq!(h.client.subscriber_count(), 2);

    let Harness {
        client,
        context,
        guard,
        ..
    } = h;
    context.shutdown().await;
    guard.shutdown().await;
    assert_eq!(client.subscriber_count(), 0);
}
