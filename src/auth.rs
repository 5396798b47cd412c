//! Credential models shared by the gateway, the refresh caller, and token stores.

pub mod pair;
pub mod secret;

pub use pair::*;
pub use secret::*;
