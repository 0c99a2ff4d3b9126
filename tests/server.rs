use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use camino::Utf8PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use geoproxy::server::{router, Payload};
use geoproxy::{
    FixtureSource, ProviderRegistry, ProviderSpec, Resolver, ResponseSource, ServerConfig,
};

fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn app(debug: bool, cache_max_age: u32) -> Router {
    let registry = ProviderRegistry::from_path(&fixtures_dir().join("providers.json")).unwrap();
    let resolver = Resolver::new(Arc::new(registry), FixtureSource::new(fixtures_dir()), debug);
    let config =
        ServerConfig::new("/geocode?", "127.0.0.1", 8000, i64::from(cache_max_age)).unwrap();
    router(Arc::new(resolver), &config)
}

fn empty_app() -> Router {
    let resolver = Resolver::new(
        Arc::new(ProviderRegistry::default()),
        FixtureSource::new(fixtures_dir()),
        false,
    );
    router(Arc::new(resolver), &ServerConfig::default())
}

/// Source standing in for a provider integration with a bug in it
#[derive(Debug)]
struct PanickingSource;

impl ResponseSource for PanickingSource {
    fn fetch(&self, provider: &ProviderSpec, _encoded_address: &str) -> geoproxy::Result<String> {
        panic!("response handling for {} blew up", provider.name);
    }
}

fn panicking_app() -> Router {
    let registry = ProviderRegistry::from_path(&fixtures_dir().join("providers.json")).unwrap();
    let resolver = Resolver::new(Arc::new(registry), PanickingSource, false);
    router(Arc::new(resolver), &ServerConfig::default())
}

async fn get(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Payload) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let payload = serde_json::from_slice(&body).expect("response body should be a JSON payload");
    (status, headers, payload)
}

#[tokio::test]
async fn resolves_address() {
    let (status, headers, payload) = get(app(false, 0), "/geocode?addr=New+York%2C+NY").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload,
        Payload::Ok {
            loc: "lat: 40.7, lon: -74.0".to_string()
        }
    );
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/json");
    assert!(headers.get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn success_carries_cache_control() {
    let (status, headers, _) = get(app(false, 3600), "/geocode?addr=New+York").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=3600"
    );
}

#[tokio::test]
async fn debug_mode_returns_trace() {
    let (status, _, payload) = get(app(true, 0), "/geocode?addr=New+York").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload,
        Payload::Debug {
            msg: vec!["provider: p2, lat: 40.7, lon: -74.0".to_string()]
        }
    );
}

#[tokio::test]
async fn missing_address_is_bad_request() {
    for uri in ["/geocode", "/geocode?addr=", "/geocode?address=New+York"] {
        let (status, headers, payload) = get(app(false, 60), uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(matches!(payload, Payload::Fail { ref msg } if msg.contains("'addr'")));
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }
}

#[tokio::test]
async fn exhausted_providers_is_bad_gateway() {
    let (status, headers, payload) = get(empty_app(), "/geocode?addr=New+York").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        payload,
        Payload::Fail {
            msg: "An error occurred with 3rd party geocode providers".to_string()
        }
    );
    assert!(headers.get(header::CACHE_CONTROL).is_none());
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (status, _, payload) = get(app(false, 0), "/lookup?addr=New+York").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        payload,
        Payload::Fail {
            msg: "Unknown resource path '/lookup?addr=New+York'".to_string()
        }
    );
}

#[tokio::test]
async fn resolver_panic_is_internal_error() {
    let app = panicking_app();
    let internal_error = Payload::Fail {
        msg: "An unknown error occurred with the geocode proxy service".to_string(),
    };

    let (status, headers, payload) = get(app.clone(), "/geocode?addr=New+York").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload, internal_error);
    assert!(headers.get(header::CACHE_CONTROL).is_none());

    // the router keeps serving after a failed request
    let (status, _, payload) = get(app.clone(), "/geocode?addr=Boston").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload, internal_error);

    let (status, _, payload) = get(app, "/geocode").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(matches!(payload, Payload::Fail { .. }));
}
