// File size resolver behavior against a mock HTTP server.
//
// The mock host serves the untrusted probe path: HEAD first, then the
// one-byte ranged GET. Expectations on the mocks prove the probe-once
// memoization contract.

use std::sync::Arc;

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use media_gateway::cache::file_size_key;
use media_gateway::{FileSize, FileSizeResolver, GatewayConfig, MemoryCache, TrustedDomains, UrlCache};

fn resolver_with_cache(cache: Arc<dyn UrlCache>) -> FileSizeResolver {
    let config = GatewayConfig::default();
    let trusted = Arc::new(TrustedDomains::from_config(&config).unwrap());
    FileSizeResolver::new(&config, trusted, cache).unwrap()
}

#[tokio::test]
async fn probes_once_and_memoizes() {
    let server = MockServer::start().await;

    // The mock host omits Content-Length on HEAD, forcing the ranged GET
    Mock::given(method("HEAD"))
        .and(path("/ep.mp3"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ep.mp3"))
        .and(header("Range", "bytes=0-0"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 0-0/1048576")
                .set_body_bytes(vec![0u8]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache: Arc<dyn UrlCache> = Arc::new(MemoryCache::new());
    let resolver = resolver_with_cache(Arc::clone(&cache));
    let url = format!("{}/ep.mp3", server.uri());

    let first = resolver.size_for(42, &url).await.expect("size resolved");
    assert_eq!(first.raw_bytes, 1_048_576);
    assert_eq!(first.formatted, "1.0 MB");

    // Second call is served from the cache; the expect(1) on the GET mock
    // verifies no second probe happened
    let second = resolver.size_for(42, &url).await.expect("size cached");
    assert_eq!(second, first);
}

#[tokio::test]
async fn cached_record_is_read_through() {
    let server = MockServer::start().await;

    // Zero allowed requests: a cached record must short-circuit the probe
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cache: Arc<dyn UrlCache> = Arc::new(MemoryCache::new());
    let url = format!("{}/ep.mp3", server.uri());

    // A record someone stored earlier, deliberately different from anything
    // the server would report
    let stored = FileSize {
        raw_bytes: 999,
        formatted: "999 B".to_string(),
    };
    cache.set(
        &file_size_key(7, &url),
        &serde_json::to_string(&stored).unwrap(),
        None,
    );

    let resolver = resolver_with_cache(Arc::clone(&cache));
    let result = resolver.size_for(7, &url).await.expect("cached record");
    assert_eq!(result, stored);
}

#[tokio::test]
async fn distinct_episodes_probe_separately() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/ep.mp3"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ep.mp3"))
        .respond_with(
            ResponseTemplate::new(206)
                .insert_header("Content-Range", "bytes 0-0/2048")
                .set_body_bytes(vec![0u8]),
        )
        .expect(2)
        .mount(&server)
        .await;

    let cache: Arc<dyn UrlCache> = Arc::new(MemoryCache::new());
    let resolver = resolver_with_cache(Arc::clone(&cache));
    let url = format!("{}/ep.mp3", server.uri());

    // Same URL under two episode ids: the cache key is the pair
    assert!(resolver.size_for(1, &url).await.is_some());
    assert!(resolver.size_for(2, &url).await.is_some());
}

#[tokio::test]
async fn unreachable_size_is_absent_not_error() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let cache: Arc<dyn UrlCache> = Arc::new(MemoryCache::new());
    let resolver = resolver_with_cache(Arc::clone(&cache));
    let url = format!("{}/gone.mp3", server.uri());

    assert!(resolver.size_for(3, &url).await.is_none());
}

#[tokio::test]
async fn unparsable_url_is_absent() {
    let cache: Arc<dyn UrlCache> = Arc::new(MemoryCache::new());
    let resolver = resolver_with_cache(cache);
    assert!(resolver.size_for(3, "not a url").await.is_none());
}
