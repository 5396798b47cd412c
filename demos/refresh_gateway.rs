//! Demonstrates a gateway recovering from an expired access token: three concurrent requests
//! hit `401`, one refresh runs, and every request is replayed with the new token.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use bearer_gateway::{
	auth::TokenPair,
	config::GatewayConfig,
	gateway::{ReqwestGateway, SessionObserver, TerminationNotice},
	http::ApiRequest,
	store::{MemoryStore, TokenStore},
};

struct PrintRedirect;
impl SessionObserver for PrintRedirect {
	fn session_terminated(&self, notice: &TerminationNotice) {
		println!("Session ended ({}); redirecting to {}.", notice.reason, notice.login_route);
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let _stale = server
		.mock_async(|when, then| {
			when.method(GET).header("authorization", "Bearer demo-expired");
			then.status(401).body("{\"message\":\"jwt expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").json_body(serde_json::json!({
				"refreshToken": "demo-refresh"
			}));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"demo-access\",\"refreshToken\":\"demo-refresh-2\"}");
		})
		.await;
	let _fresh = server
		.mock_async(|when, then| {
			when.method(GET).header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body("{\"ok\":true}");
		})
		.await;
	let _logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout");
			then.status(204);
		})
		.await;
	let store: Arc<dyn TokenStore> = Arc::new(MemoryStore::default());
	let config = GatewayConfig::builder(Url::parse(&server.base_url())?).build()?;
	let gateway = ReqwestGateway::new(config, store)?.with_observer(Arc::new(PrintRedirect));

	gateway.establish_session(TokenPair::new("demo-expired").with_refresh_token("demo-refresh"))?;

	let (words, lists, progress) = tokio::join!(
		gateway.send(ApiRequest::get("/words")),
		gateway.send(ApiRequest::get("/lists")),
		gateway.send(ApiRequest::get("/progress")),
	);

	for response in [words?, lists?, progress?] {
		println!("{} -> {}", response.status(), response.text());
	}

	refresh.assert_async().await;
	println!(
		"Refreshes: {}, replays: {}.",
		gateway.metrics.refresh_attempts(),
		gateway.metrics.replays()
	);

	gateway.logout().await;

	Ok(())
}
