//! Integration tests for the query cache, tag invalidation, and mutations.

mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleetsync::{
    create_client, delete_video, force_refresh_client, CreateClient, Client, EntityStore,
    PageParams, QueryCache, ResourceKind, SyncContext, SyncError, Tag, UpdateClient, Video,
};
use support::transport::{client_value, video_value, MockTransport};
use support::wait_until;

fn context(transport: &Arc<MockTransport>) -> SyncContext {
    SyncContext::new(Arc::clone(transport) as Arc<dyn fleetsync::Transport>)
}

#[tokio::test]
async fn list_fetch_populates_cache_and_store() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", true)]);
    let ctx = context(&transport);

    let result = ctx.fetch_list::<Client>(PageParams::default()).await.unwrap();
    let page = result.data.unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "Lobby");
    assert!(page.data[0].is_online);
    assert_eq!(page.meta.total, 1);

    let stored: Client = ctx.store().get("c1").unwrap().unwrap();
    assert_eq!(stored.name, "Lobby");
}

#[tokio::test]
async fn write_then_read_returns_fresh_value() {
    let transport = Arc::new(MockTransport::new());
    let ctx = context(&transport);

    let client: Client = serde_json::from_value(client_value("c1", "Lobby", true)).unwrap();
    ctx.write(&client).unwrap();

    let result = ctx.read_one::<Client>("c1").unwrap();
    assert_eq!(result.data.unwrap().name, "Lobby");
    assert!(!result.is_stale);
    assert!(!result.is_loading);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn concurrent_reads_share_one_fetch() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    transport.close_gate();
    let ctx = context(&transport);

    let bg = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.ensure_list::<Client>(PageParams::default()).await })
    };
    {
        let transport = Arc::clone(&transport);
        wait_until(move || transport.call_count() == 1).await;
    }

    // A second read in the fetch window must not issue another request.
    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();
    assert_eq!(transport.call_count(), 1);

    transport.open_gate();
    bg.await.unwrap().unwrap();
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 1);
}

#[tokio::test]
async fn equivalent_params_share_one_entry() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    let ctx = context(&transport);

    ctx.ensure_list::<Client>(PageParams::new(None, None)).await.unwrap();
    ctx.ensure_list::<Client>(PageParams::new(Some(1), Some(10)))
        .await
        .unwrap();
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 1);
}

#[tokio::test]
async fn mutation_invalidates_and_refetches_subscribed_list() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    let ctx = context(&transport);

    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();

    let notified = Arc::new(AtomicUsize::new(0));
    let notified_cb = Arc::clone(&notified);
    let (sub, needs_fetch) = ctx.subscribe_list::<Client>(
        PageParams::default(),
        Arc::new(move || {
            notified_cb.fetch_add(1, Ordering::SeqCst);
        }),
    );
    assert!(!needs_fetch);

    // Server state after the create.
    transport.push_create(client_value("c2", "Foyer", false));
    transport.set_list(
        ResourceKind::Client,
        vec![
            client_value("c1", "Lobby", false),
            client_value("c2", "Foyer", false),
        ],
    );

    let created = create_client(
        &ctx,
        CreateClient {
            name: "Foyer".into(),
            description: None,
            location: None,
            login_id: "foyer-1".into(),
            password: "secret123".into(),
            layout_id: None,
            sequence_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(created.id, "c2");

    // Exactly one refetch for the one subscribed query.
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 2);
    assert!(notified.load(Ordering::SeqCst) >= 1);

    let page = ctx.read_list::<Client>(PageParams::default()).unwrap().data.unwrap();
    assert_eq!(page.data.len(), 2);

    sub.unsubscribe();
}

#[tokio::test]
async fn unobserved_queries_revalidate_lazily() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    let ctx = context(&transport);

    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 1);

    // No subscriber: the invalidation marks stale but does not refetch.
    ctx.invalidate(&[Tag::list(ResourceKind::Client)]).await;
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 1);

    let result = ctx.read_list::<Client>(PageParams::default()).unwrap();
    assert!(result.is_stale);
    assert!(result.data.is_some());

    // The next subscribe reports the entry needs revalidation.
    let (sub, needs_fetch) = ctx.subscribe_list::<Client>(PageParams::default(), Arc::new(|| {}));
    assert!(needs_fetch);
    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 2);
    assert!(!ctx.read_list::<Client>(PageParams::default()).unwrap().is_stale);

    sub.unsubscribe();
}

#[tokio::test]
async fn late_response_does_not_overwrite_newer_entity() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Old name", false)]);
    transport.close_gate();
    let ctx = context(&transport);

    // R1: list fetch held open at the transport.
    let bg = {
        let ctx = ctx.clone();
        tokio::spawn(async move { ctx.ensure_list::<Client>(PageParams::default()).await })
    };
    {
        let transport = Arc::clone(&transport);
        wait_until(move || transport.call_count() == 1).await;
    }

    // R2: an update issued later resolves first.
    transport.push_patch(client_value("c1", "New name", false));
    let updated = fleetsync::update_client(
        &ctx,
        "c1",
        UpdateClient {
            name: Some("New name".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "New name");

    // R1 resolves late; its payload for c1 must be discarded.
    transport.open_gate();
    bg.await.unwrap().unwrap();

    let stored: Client = ctx.store().get("c1").unwrap().unwrap();
    assert_eq!(stored.name, "New name");
    let page = ctx.read_list::<Client>(PageParams::default()).unwrap().data.unwrap();
    assert_eq!(page.data[0].name, "New name");
}

#[tokio::test]
async fn validation_failure_issues_no_network_call() {
    let transport = Arc::new(MockTransport::new());
    let ctx = context(&transport);

    let err = create_client(
        &ctx,
        CreateClient {
            name: "Lobby".into(),
            description: None,
            location: None,
            login_id: "lobby-1".into(),
            password: "123".into(),
            layout_id: None,
            sequence_id: None,
        },
    )
    .await
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn authentication_failure_surfaces_distinctly() {
    let transport = Arc::new(MockTransport::new());
    transport.fail_next(SyncError::from_status(401, "token expired"));
    let ctx = context(&transport);

    let err = ctx
        .ensure_list::<Client>(PageParams::default())
        .await
        .unwrap_err();
    assert!(err.is_authentication());
    // No automatic retry by the cache layer.
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn failed_refetch_leaves_prior_data_intact() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    let ctx = context(&transport);

    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();
    let (sub, _) = ctx.subscribe_list::<Client>(PageParams::default(), Arc::new(|| {}));

    transport.fail_next(SyncError::Transport {
        status: Some(500),
        message: "boom".into(),
    });
    ctx.invalidate(&[Tag::list(ResourceKind::Client)]).await;

    let result = ctx.read_list::<Client>(PageParams::default()).unwrap();
    assert_eq!(result.data.unwrap().data[0].name, "Lobby");
    assert!(result.is_stale);

    sub.unsubscribe();
}

#[tokio::test]
async fn delete_drops_entity_and_list_membership() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(
        ResourceKind::Video,
        vec![video_value("v1", "First"), video_value("v2", "Second")],
    );
    let ctx = context(&transport);

    ctx.ensure_list::<Video>(PageParams::default()).await.unwrap();
    delete_video(&ctx, "v1").await.unwrap();

    assert_eq!(transport.calls_matching("DELETE /admin/videos/v1"), 1);
    let page = ctx.read_list::<Video>(PageParams::default()).unwrap().data.unwrap();
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].id, "v2");
    assert!(ctx.read_one::<Video>("v1").unwrap().data.is_none());
}

#[tokio::test]
async fn force_refresh_invalidates_client_list() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    let ctx = context(&transport);

    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();
    let (sub, _) = ctx.subscribe_list::<Client>(PageParams::default(), Arc::new(|| {}));

    force_refresh_client(&ctx, "c1").await.unwrap();

    assert_eq!(transport.calls_matching("POST /admin/clients/c1/refresh"), 1);
    assert_eq!(transport.calls_matching("GET /admin/clients?"), 2);

    sub.unsubscribe();
}

#[tokio::test]
async fn unsubscribed_entries_are_swept_after_grace() {
    let transport = Arc::new(MockTransport::new());
    let cache = QueryCache::new(EntityStore::new()).with_retention(Duration::ZERO);
    let ctx = SyncContext::with_cache(Arc::clone(&transport) as Arc<dyn fleetsync::Transport>, cache);

    let (sub, _) = ctx.subscribe_list::<Client>(PageParams::default(), Arc::new(|| {}));
    assert_eq!(ctx.cache().len(), 1);

    sub.unsubscribe();
    ctx.cache().sweep();
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn dispose_tears_down_cache_and_store() {
    let transport = Arc::new(MockTransport::new());
    transport.set_list(ResourceKind::Client, vec![client_value("c1", "Lobby", false)]);
    let ctx = context(&transport);

    ctx.ensure_list::<Client>(PageParams::default()).await.unwrap();
    ctx.dispose();

    assert!(ctx.cache().is_empty());
    assert!(ctx.store().get::<Client>("c1").unwrap().is_none());
    assert_eq!(
        ctx.ensure_list::<Client>(PageParams::default()).await.unwrap_err(),
        SyncError::Disposed
    );
}
