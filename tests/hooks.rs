//! Query / Mutation wired to real resource calls.

mod common;

use common::{MockServerFixture, RecordingProvider};
use mapmyclient_sdk::hooks::{Mutation, Query, Settlement};
use mapmyclient_sdk::resources::ListParams;
use mapmyclient_sdk::{CrudResource, PipelineError};
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn company_search_query_settles_with_data() {
    let mut fx = MockServerFixture::new().await;
    fx.server
        .mock("GET", "/api/companies")
        .match_query(mockito::Matcher::UrlEncoded("search".into(), "acme".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"id":1,"name":"Acme Corp"}]"#)
        .create_async()
        .await;

    let client = Arc::new(fx.client_with(RecordingProvider::with_token("t")));
    let c = client.clone();
    let (query, first) = Query::mount("acme".to_string(), move |search: &String| {
        let c = c.clone();
        let params = ListParams::new().search(search.clone());
        async move { c.companies().list::<Value>(&params).await }
    });

    assert!(query.state().loading);
    assert_eq!(first.spawn().await.unwrap(), Settlement::Committed);

    let state = query.state();
    assert_eq!(state.data, Some(json!([{"id": 1, "name": "Acme Corp"}])));
    assert_eq!(state.error, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn failed_delete_mutation_records_and_returns_not_found() {
    let mut fx = MockServerFixture::new().await;
    fx.server
        .mock("DELETE", "/api/contacts/42")
        .with_status(404)
        .with_body(r#"{"detail":"Contact not found"}"#)
        .create_async()
        .await;

    let client = Arc::new(fx.anonymous_client());
    let c = client.clone();
    let remove = Mutation::new(move |id: i64| {
        let c = c.clone();
        async move { c.contacts().delete::<Value>(id).await }
    });

    let pending = remove.mutate(42);
    assert!(remove.state().loading);

    let result = pending.await;
    assert_eq!(result, Err(PipelineError::NotFound));
    let state = remove.state();
    assert_eq!(state.error, Some(PipelineError::NotFound));
    assert!(!state.loading);
}

#[tokio::test]
async fn refetch_runs_an_independent_cycle_each_time() {
    let mut fx = MockServerFixture::new().await;
    let mock = fx
        .server
        .mock("GET", "/api/dashboard/statistics")
        .match_query(mockito::Matcher::UrlEncoded("date_range".into(), "30d".into()))
        .with_status(200)
        .with_body(r#"{"total_opportunities":3}"#)
        .expect(3)
        .create_async()
        .await;

    let client = Arc::new(fx.anonymous_client());
    let c = client.clone();
    let (query, first) = Query::mount(
        mapmyclient_sdk::resources::DEFAULT_DATE_RANGE.to_string(),
        move |range: &String| {
            let c = c.clone();
            let range = range.clone();
            async move { c.dashboard().statistics::<Value>(&range).await }
        },
    );
    first.settle().await;

    for _ in 0..2 {
        let next = query.refetch();
        assert!(query.state().loading);
        assert_eq!(query.state().data, None);
        assert_eq!(next.settle().await, Settlement::Committed);
        assert_eq!(
            query.state().data,
            Some(json!({"total_opportunities": 3}))
        );
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn query_error_is_observable_in_state() {
    let mut fx = MockServerFixture::new().await;
    fx.server
        .mock("GET", "/api/proposals/statistics")
        .with_status(403)
        .create_async()
        .await;

    let client = Arc::new(fx.anonymous_client());
    let c = client.clone();
    let (query, first) = Query::mount((), move |_: &()| {
        let c = c.clone();
        async move { c.proposals().statistics::<Value>().await }
    });
    let mut rx = query.subscribe();
    first.spawn();

    rx.changed().await.unwrap();
    let state = rx.borrow().clone();
    assert_eq!(state.error, Some(PipelineError::Forbidden));
    assert_eq!(state.data, None);
    assert!(!state.loading);
}
