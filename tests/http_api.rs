//! HTTP contract tests over the full wiring: memory backends, real issuer,
//! warp test requests. Asserts the status codes and the uniform error body
//! the endpoints promise.

use gatehouse::api;
use gatehouse::domain_model::Role;
use gatehouse::server::Server;
use gatehouse::settings::*;
use serde_json::Value;
use std::sync::Arc;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::Response;

fn test_settings() -> Settings {
    Settings {
        auth: Auth {
            backend: "real".to_string(),
            issuer: "gatehouse.test".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604800,
            access_secret: "http-access-secret".to_string(),
            access_legacy_secrets: vec![],
            refresh_secret: "http-refresh-secret".to_string(),
        },
        store: Store {
            backend: "memory".to_string(),
            redis_url: None,
            key_prefix: "gatehouse-test".to_string(),
        },
        directory: Directory {
            backend: "memory".to_string(),
            mysql_dsn: None,
            seed: vec![SeedPrincipal {
                email: "alice@example.com".to_string(),
                password: "password123".to_string(),
                role: Role::User,
            }],
        },
        http: Http {
            address: "127.0.0.1:0".to_string(),
        },
        log: Log {
            filter: "warn".to_string(),
        },
    }
}

async fn test_routes() -> BoxedFilter<(Response,)> {
    let server = Arc::new(Server::try_new(&test_settings()).await.unwrap());
    api::v1::routes(server)
        .recover(api::v1::recover_error)
        .map(|reply| warp::Reply::into_response(reply))
        .boxed()
}

fn body_json<B: AsRef<[u8]>>(res: &warp::http::Response<B>) -> Value {
    serde_json::from_slice(res.body().as_ref()).unwrap()
}

async fn do_login(routes: &BoxedFilter<(Response,)>) -> Value {
    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&serde_json::json!({
            "email": "alice@example.com",
            "password": "password123"
        }))
        .reply(routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    body_json(&res)
}

#[tokio::test]
async fn login_returns_a_token_pair() {
    let routes = test_routes().await;
    let body = do_login(&routes).await;

    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert!(data["access_expires_at"].is_string());
    assert!(data["refresh_expires_at"].is_string());
    assert_eq!(data["principal"]["email"], "alice@example.com");
}

#[tokio::test]
async fn login_with_a_wrong_password_is_401() {
    let routes = test_routes().await;
    let res = warp::test::request()
        .method("POST")
        .path("/login")
        .json(&serde_json::json!({
            "email": "alice@example.com",
            "password": "wrong"
        }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(&res)["success"], false);
}

#[tokio::test]
async fn refresh_rotates_then_rejects_replay() {
    let routes = test_routes().await;
    let body = do_login(&routes).await;
    let r1 = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let res = warp::test::request()
        .method("POST")
        .path("/refresh")
        .json(&serde_json::json!({ "refresh_token": r1 }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let rotated = body_json(&res);
    assert!(rotated["data"]["refresh_token"].is_string());

    // Replay of the consumed token: the uniform 401.
    let res = warp::test::request()
        .method("POST")
        .path("/refresh")
        .json(&serde_json::json!({ "refresh_token": r1 }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let replayed = body_json(&res);
    assert_eq!(replayed["success"], false);
    assert_eq!(
        replayed["error"]["message"],
        "invalid or expired credentials"
    );
}

#[tokio::test]
async fn refresh_without_the_field_is_400() {
    let routes = test_routes().await;
    let res = warp::test::request()
        .method("POST")
        .path("/refresh")
        .json(&serde_json::json!({}))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn garbage_refresh_token_is_401() {
    let routes = test_routes().await;
    let res = warp::test::request()
        .method("POST")
        .path("/refresh")
        .json(&serde_json::json!({ "refresh_token": "not-a-jwt" }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_always_succeeds_and_kills_the_chain() {
    let routes = test_routes().await;
    let body = do_login(&routes).await;
    let r1 = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let res = warp::test::request()
        .method("POST")
        .path("/logout")
        .json(&serde_json::json!({ "refresh_token": r1 }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(&res)["success"], true);

    // Logout of an already-dead token still reads as success.
    let res = warp::test::request()
        .method("POST")
        .path("/logout")
        .json(&serde_json::json!({ "refresh_token": "garbage" }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(&res)["success"], true);

    // But the logged-out chain cannot rotate any more.
    let res = warp::test::request()
        .method("POST")
        .path("/refresh")
        .json(&serde_json::json!({ "refresh_token": r1 }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_round_trip() {
    let routes = test_routes().await;
    let body = do_login(&routes).await;
    let access = body["data"]["access_token"].as_str().unwrap();

    let res = warp::test::request()
        .method("GET")
        .path("/me")
        .header("authorization", format!("Bearer {access}"))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let me = body_json(&res);
    assert_eq!(me["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn protected_route_rejects_missing_and_bad_tokens_alike() {
    let routes = test_routes().await;

    let res = warp::test::request()
        .method("GET")
        .path("/me")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let missing = body_json(&res);

    let res = warp::test::request()
        .method("GET")
        .path("/me")
        .header("authorization", "Bearer nonsense")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let bad = body_json(&res);

    // Identical generic body either way; no oracle.
    assert_eq!(missing["error"]["message"], bad["error"]["message"]);
}

#[tokio::test]
async fn access_token_still_works_after_logout() {
    let routes = test_routes().await;
    let body = do_login(&routes).await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    let r1 = body["data"]["refresh_token"].as_str().unwrap().to_string();

    let res = warp::test::request()
        .method("POST")
        .path("/logout")
        .json(&serde_json::json!({ "refresh_token": r1 }))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Documented: logout blacklists the refresh id only, so the stateless
    // access token rides out its own expiry.
    let res = warp::test::request()
        .method("GET")
        .path("/me")
        .header("authorization", format!("Bearer {access}"))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}
