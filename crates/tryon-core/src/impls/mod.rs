//! Impls - concrete adapters for the ports.
//!
//! - **InMemoryKeyValueStore** / **FileKeyValueStore**: storage backends
//! - **GeminiGateway**: the hosted generation service
//! - **ScriptedGateway**: canned responses for tests and offline runs

pub mod file_store;
pub mod gemini_gateway;
pub mod inmem_store;
pub mod scripted_gateway;

pub use self::file_store::FileKeyValueStore;
pub use self::gemini_gateway::GeminiGateway;
pub use self::inmem_store::InMemoryKeyValueStore;
pub use self::scripted_gateway::{GatewayCall, ScriptedGateway};
