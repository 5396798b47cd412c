#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use bearer_gateway::{
	config::GatewayConfig,
	error::{Error, RefreshError},
	gateway::ReqwestGateway,
	http::ApiRequest,
	store::{MemoryStore, TokenKey, TokenStore},
	url::Url,
};
use http::StatusCode;
use httpmock::prelude::*;

fn build_gateway(server: &MockServer, store: &MemoryStore) -> ReqwestGateway {
	let config = GatewayConfig::builder(
		Url::parse(&server.base_url()).expect("Mock server URL should parse successfully."),
	)
	.build()
	.expect("Gateway config should validate for the mock server.");
	let backend: Arc<dyn TokenStore> = Arc::new(store.clone());

	ReqwestGateway::new(config, backend).expect("Reqwest gateway should build successfully.")
}

fn expired_store() -> MemoryStore {
	MemoryStore::seeded([(TokenKey::AccessToken, "OLD"), (TokenKey::RefreshToken, "VALID")])
}

fn stored(store: &MemoryStore, key: TokenKey) -> Option<String> {
	store
		.load(key)
		.expect("Memory loads are infallible.")
		.map(|secret| secret.expose().to_owned())
}

#[tokio::test]
async fn expired_tokens_are_refreshed_and_the_request_replayed() {
	let server = MockServer::start_async().await;
	let store = expired_store();
	let gateway = build_gateway(&server, &store);
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/words").header("authorization", "Bearer OLD");
			then.status(401).body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh")
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "refreshToken": "VALID" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"NEW\",\"refresh\":\"ROT\"}");
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/words").header("authorization", "Bearer NEW");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"term\":\"lucid\"}]");
		})
		.await;
	let words: serde_json::Value =
		gateway.get_json("/words").await.expect("Replayed request should succeed.");

	stale.assert_async().await;
	refresh.assert_async().await;
	fresh.assert_async().await;

	assert_eq!(words, serde_json::json!([{ "term": "lucid" }]));
	assert_eq!(stored(&store, TokenKey::AccessToken).as_deref(), Some("NEW"));
	assert_eq!(stored(&store, TokenKey::RefreshToken).as_deref(), Some("ROT"));
}

#[tokio::test]
async fn rejected_refresh_clears_the_session() {
	let server = MockServer::start_async().await;
	let store = expired_store();
	let gateway = build_gateway(&server, &store);
	let _stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/words");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(403).body("refresh token revoked");
		})
		.await;
	let err = gateway
		.send(ApiRequest::get("/words"))
		.await
		.expect_err("A rejected refresh must fail the request.");

	refresh.assert_async().await;

	match err {
		Error::Refresh(RefreshError::Rejected { status, body }) => {
			assert_eq!(status, StatusCode::FORBIDDEN);
			assert_eq!(body, "refresh token revoked");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(store.is_empty());
}

#[tokio::test]
async fn server_errors_pass_through_without_refreshing() {
	let server = MockServer::start_async().await;
	let store = expired_store();
	let gateway = build_gateway(&server, &store);
	let boom = server
		.mock_async(|when, then| {
			when.method(POST).path("/lists");
			then.status(500).body("database unavailable");
		})
		.await;
	let request = ApiRequest::post("/lists")
		.json(&serde_json::json!({ "name": "GRE" }))
		.expect("JSON values always serialize.");
	let err = gateway.send(request).await.expect_err("500 must surface to the caller.");

	boom.assert_async().await;

	assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
	assert_eq!(gateway.metrics.refresh_attempts(), 0);
	assert_eq!(stored(&store, TokenKey::AccessToken).as_deref(), Some("OLD"));
}

#[tokio::test]
async fn logout_revokes_the_server_session() {
	let server = MockServer::start_async().await;
	let store = expired_store();
	let gateway = build_gateway(&server, &store);
	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout").header("authorization", "Bearer OLD");
			then.status(204);
		})
		.await;

	gateway.logout().await;
	logout.assert_async().await;

	assert!(store.is_empty());
}
