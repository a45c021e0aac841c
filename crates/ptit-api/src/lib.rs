// ptit-api: Async Rust client for the PTIT IoT Platform REST backend

pub mod client;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::Error;
pub use session::{SessionProvider, SharedSession, StaticToken};
pub use transport::{TlsMode, TransportConfig};
