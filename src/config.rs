//! Gateway configuration: API host, endpoint paths, and the login route.

// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
const DEFAULT_LOGOUT_PATH: &str = "/auth/logout";
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Validated configuration consumed by [`Gateway`](crate::gateway::Gateway).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
	/// API host that relative request targets are appended to.
	pub base_url: Url,
	/// Selects a mock backend instead of the real API. The gateway itself attaches no
	/// behavior to the flag; the application shell reads it to pick a transport.
	#[serde(default)]
	pub use_mock: bool,
	/// Path (relative to `base_url`) of the token refresh endpoint.
	#[serde(default = "default_refresh_path")]
	pub refresh_path: String,
	/// Path (relative to `base_url`) of the server-side logout endpoint.
	#[serde(default = "default_logout_path")]
	pub logout_path: String,
	/// Application route users are sent to once their session ends.
	#[serde(default = "default_login_route")]
	pub login_route: String,
}
impl GatewayConfig {
	/// Creates a builder seeded with the provided API host.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(document);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::InvalidDocument { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Checks that the base URL can host relative API paths.
	pub fn validate(&self) -> Result<(), ConfigError> {
		match self.base_url.scheme() {
			"http" | "https" => {},
			other => return Err(ConfigError::UnsupportedScheme { scheme: other.into() }),
		}

		if self.base_url.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { url: self.base_url.to_string() });
		}

		Ok(())
	}

	/// Resolves a request target against the base URL.
	///
	/// Absolute `http(s)` targets are used as-is. Anything else is appended to the base URL's
	/// path, so a base of `https://host/api` and a target of `/words` yield
	/// `https://host/api/words`.
	pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		if let Ok(url) = Url::parse(target)
			&& matches!(url.scheme(), "http" | "https")
		{
			return Ok(url);
		}

		let mut joined = self.base_url.as_str().trim_end_matches('/').to_owned();

		joined.push('/');
		joined.push_str(target.trim_start_matches('/'));

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidUrl { target: target.to_owned(), source })
	}

	/// Absolute URL of the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.refresh_path)
	}

	/// Absolute URL of the logout endpoint.
	pub fn logout_endpoint(&self) -> Result<Url, ConfigError> {
		self.resolve(&self.logout_path)
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	base_url: Url,
	use_mock: bool,
	refresh_path: String,
	logout_path: String,
	login_route: String,
}
impl GatewayConfigBuilder {
	/// Creates a new builder with default endpoint paths.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			use_mock: false,
			refresh_path: default_refresh_path(),
			logout_path: default_logout_path(),
			login_route: default_login_route(),
		}
	}

	/// Toggles the mock-backend flag.
	pub fn use_mock(mut self, use_mock: bool) -> Self {
		self.use_mock = use_mock;

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the login route announced on session termination.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Validates and returns the configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let config = GatewayConfig {
			base_url: self.base_url,
			use_mock: self.use_mock,
			refresh_path: self.refresh_path,
			logout_path: self.logout_path,
			login_route: self.login_route,
		};

		config.validate()?;

		Ok(config)
	}
}

fn default_refresh_path() -> String {
	DEFAULT_REFRESH_PATH.into()
}

fn default_logout_path() -> String {
	DEFAULT_LOGOUT_PATH.into()
}

fn default_login_route() -> String {
	DEFAULT_LOGIN_ROUTE.into()
}
