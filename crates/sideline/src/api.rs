//! HTTP-backed page fetchers for the app's list endpoints.
//!
//! Each [`ListEndpoint`] pairs with an [`HttpPageFetcher`], which plugs into
//! [`FeedSynchronizer`](crate::feed::FeedSynchronizer) like any other
//! [`PageFetcher`](crate::fetch::PageFetcher).

mod client;
mod endpoint;
mod types;

pub use client::HttpPageFetcher;
pub use endpoint::ListEndpoint;
pub use types::ApiRecord;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::feed::{FeedOptions, FeedSynchronizer};
    use crate::fetch::{CancellationToken, FetchError, PageFetcher};
    use crate::http::{HttpResponse, MockTransport, header_get};
    use crate::retry::RetryConfig;

    const BASE: &str = "https://api.example.com/v1";

    fn fetcher(transport: &MockTransport, endpoint: ListEndpoint) -> HttpPageFetcher<ApiRecord> {
        let base = Url::parse(BASE).expect("valid base url");
        HttpPageFetcher::new(Arc::new(transport.clone()), base, endpoint)
    }

    fn page_body(ids: &[&str], has_next: bool) -> Vec<u8> {
        let data: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({ "id": id, "title": format!("post {id}") }))
            .collect();
        serde_json::to_vec(&serde_json::json!({
            "data": data,
            "meta": { "hasNextPage": has_next },
        }))
        .expect("serialize body")
    }

    #[test]
    fn test_endpoint_paths_and_labels() {
        assert_eq!(ListEndpoint::EventsFeed.path(), "/posts");
        assert_eq!(ListEndpoint::MyMatches.path(), "/matches/me");
        assert_eq!(
            ListEndpoint::PendingRequests {
                group_id: "g7".to_string()
            }
            .path(),
            "/groups/g7/requests"
        );
        assert_eq!(ListEndpoint::Groups.to_string(), "groups");
    }

    #[test]
    fn test_endpoint_default_empty_conditions() {
        let events = ListEndpoint::EventsFeed.default_empty_conditions();
        assert!(events.matches(&FetchError::status(400, "")));
        assert!(events.matches(&FetchError::status(404, "")));
        assert!(ListEndpoint::MatchFeed.default_empty_conditions().is_empty());
    }

    #[test]
    fn test_page_url_includes_pagination_and_extra_query() {
        let transport = MockTransport::new();
        let url = fetcher(&transport, ListEndpoint::MatchFeed)
            .page_url(3, 20)
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v1/matches?page=3&limit=20&status=open"
        );
    }

    #[test]
    fn test_api_record_accepts_numeric_ids() {
        let record: ApiRecord =
            serde_json::from_str(r#"{"id": 42, "name": "Sunday league"}"#).expect("record");
        assert_eq!(record.id, "42");
        assert_eq!(record.summary(), "Sunday league");

        let record: ApiRecord =
            serde_json::from_str(r#"{"id": "p1", "content": "line one\nline two"}"#)
                .expect("record");
        assert_eq!(record.summary(), "line one");
    }

    #[tokio::test]
    async fn fetch_page_sends_auth_and_decodes_envelope() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/posts?page=1&limit=2"),
            HttpResponse::json(200, page_body(&["a", "b"], true)),
        );

        let fetcher = fetcher(&transport, ListEndpoint::EventsFeed).with_token("secret");
        let response = fetcher
            .fetch_page(1, 2, &CancellationToken::new())
            .await
            .expect("page");

        let ids: Vec<_> = response.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(response.meta.and_then(|m| m.has_next_page), Some(true));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            header_get(&requests[0].headers, "authorization"),
            Some("Bearer secret")
        );
        assert_eq!(
            header_get(&requests[0].headers, "accept"),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn fetch_page_maps_transport_failure_to_network_error() {
        let transport = MockTransport::new();
        transport.push_error(format!("{BASE}/groups/me?page=1&limit=20"), "connection reset");

        let err = fetcher(&transport, ListEndpoint::Groups)
            .fetch_page(1, 20, &CancellationToken::new())
            .await
            .expect_err("network error");
        assert!(matches!(err, FetchError::Network { .. }));
        assert!(!err.is_cancellation());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_page_retries_rate_limited_responses() {
        let transport = MockTransport::new();
        let url = format!("{BASE}/posts/me?page=1&limit=20");
        transport.push_response(&url, HttpResponse::json(429, Vec::new()));
        transport.push_response(&url, HttpResponse::json(200, page_body(&["x"], false)));

        let fetcher = fetcher(&transport, ListEndpoint::MyPosts).with_retry_config(
            RetryConfig::new(Duration::from_millis(10), Duration::from_millis(10), 2)
                .with_jitter(false),
        );
        let response = fetcher
            .fetch_page(1, 20, &CancellationToken::new())
            .await
            .expect("page after retry");

        assert_eq!(response.data.len(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn fetch_page_does_not_send_when_cancelled() {
        let transport = MockTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetcher(&transport, ListEndpoint::EventsFeed)
            .fetch_page(1, 20, &cancel)
            .await
            .expect_err("cancelled");
        assert_eq!(err, FetchError::Cancelled);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn feed_over_http_treats_404_past_the_end_as_last_page() {
        let transport = MockTransport::new();
        transport.push_response(
            format!("{BASE}/posts?page=1&limit=2"),
            HttpResponse::json(200, page_body(&["a", "b"], true)),
        );
        transport.push_response(
            format!("{BASE}/posts?page=2&limit=2"),
            HttpResponse::json(404, br#"{"message":"No posts found"}"#.to_vec()),
        );

        let endpoint = ListEndpoint::EventsFeed;
        let options = FeedOptions::new(endpoint.label())
            .with_page_size(2)
            .with_empty_page_conditions(endpoint.default_empty_conditions());
        let feed: FeedSynchronizer<ApiRecord, _> =
            FeedSynchronizer::new(fetcher(&transport, endpoint), options);

        feed.load_initial().await;
        feed.load_next_page().await;

        let state = feed.snapshot();
        let ids: Vec<_> = state.items().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(state.page(), 2);
        assert!(!state.has_next_page());
        assert!(state.error().is_none());
    }
}
