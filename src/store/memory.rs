//! Thread-safe in-memory [`TokenStore`] implementation for tests and ephemeral sessions.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{StoreError, TokenKey, TokenStore},
};

type StoreMap = Arc<RwLock<HashMap<TokenKey, TokenSecret>>>;

/// Storage backend that keeps the token pair in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Creates a store pre-seeded with the provided entries.
	pub fn seeded<I, S>(entries: I) -> Self
	where
		I: IntoIterator<Item = (TokenKey, S)>,
		S: Into<TokenSecret>,
	{
		let map = entries.into_iter().map(|(key, secret)| (key, secret.into())).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	/// Returns `true` when no token is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenStore for MemoryStore {
	fn load(&self, key: TokenKey) -> Result<Option<TokenSecret>, StoreError> {
		Ok(self.0.read().get(&key).cloned())
	}

	fn save(&self, key: TokenKey, secret: TokenSecret) -> Result<(), StoreError> {
		self.0.write().insert(key, secret);

		Ok(())
	}

	fn remove(&self, key: TokenKey) -> Result<(), StoreError> {
		self.0.write().remove(&key);

		Ok(())
	}
}
