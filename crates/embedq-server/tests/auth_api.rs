//! Every route except /health requires `Authorization: Bearer <AUTH_TOKEN>`.

mod common;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, send};
use rstest::rstest;

fn request(method: Method, uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[rstest]
#[case(None, "Missing Authorization header")]
#[case(Some("Bearer wrong-token"), "Invalid token")]
#[case(Some("Basic dGVzdDp0ZXN0"), "Invalid authorization header")]
#[tokio::test]
async fn worker_next_rejects_bad_credentials(
    #[case] authorization: Option<&str>,
    #[case] message: &str,
) {
    let app = common::build_test_app();

    let response = send(app, request(Method::POST, "/worker/next", authorization)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], message);
}

#[rstest]
#[case(Method::POST, "/tasks")]
#[case(Method::GET, "/tasks/task-01ARZ3NDEKTSV4RRFFQ69G5FAV")]
#[case(Method::GET, "/tasks/task-01ARZ3NDEKTSV4RRFFQ69G5FAV/result")]
#[case(Method::POST, "/worker/complete/task-01ARZ3NDEKTSV4RRFFQ69G5FAV")]
#[case(Method::POST, "/worker/fail/task-01ARZ3NDEKTSV4RRFFQ69G5FAV")]
#[case(Method::POST, "/v1/embeddings")]
#[tokio::test]
async fn every_api_route_requires_a_token(#[case] method: Method, #[case] uri: &str) {
    let app = common::build_test_app();

    let response = send(app, request(method, uri, None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_is_accepted() {
    let app = common::build_test_app();
    let bearer = format!("Bearer {}", common::TOKEN);

    let response = send(app, request(Method::POST, "/worker/next", Some(&bearer))).await;

    assert_eq!(response.status(), StatusCode::OK);
}
