//! `HttpAuthClient` against an in-process fake backend.

use std::time::Duration;

use apay_core::client::LOGIN_FAILED_FALLBACK;
use apay_core::{AuthClient, AuthError, ChurchId, Credentials, HttpAuthClient, Identity, Role};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn fake_login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match (body["usuario"].as_str(), body["password"].as_str()) {
        (Some("admin1"), Some("clave")) => (
            StatusCode::OK,
            Json(json!({
                "idUsuario": 1,
                "usuario": "admin1",
                "rol": "admin",
                "nombreResponsable": "Marta Gómez",
                "idIglesia": "4"
            })),
        ),
        (Some("raro"), Some("clave")) => (
            StatusCode::OK,
            Json(json!({
                "usuario": "raro",
                "rol": "tienda",
                "nombreResponsable": "X",
                "idIglesia": 1
            })),
        ),
        (Some("mudo"), _) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Usuario o contraseña incorrectos" })),
        ),
    }
}

async fn client() -> HttpAuthClient {
    let url = serve(Router::new().route("/login", post(fake_login))).await;
    HttpAuthClient::new(url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn successful_login_returns_identity() {
    let identity = client()
        .await
        .authenticate(&Credentials::new("admin1", "clave"))
        .await
        .unwrap();
    assert_eq!(
        identity,
        Identity::new("admin1", Role::Admin, "Marta Gómez", ChurchId(4))
    );
}

#[tokio::test]
async fn rejection_carries_backend_message() {
    let err = client()
        .await
        .authenticate(&Credentials::new("admin1", "mala"))
        .await
        .unwrap_err();
    match err {
        AuthError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Usuario o contraseña incorrectos");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejection_without_message_uses_fallback() {
    let err = client()
        .await
        .authenticate(&Credentials::new("mudo", "x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Rejected { status: 500, ref message } if message == LOGIN_FAILED_FALLBACK
    ));
}

#[tokio::test]
async fn unknown_role_is_an_invalid_response() {
    let err = client()
        .await
        .authenticate(&Credentials::new("raro", "clave"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidResponse(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpAuthClient::new(
        Url::parse(&format!("http://{addr}")).unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();
    let err = client
        .authenticate(&Credentials::new("admin1", "clave"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Connection(_)));
}
