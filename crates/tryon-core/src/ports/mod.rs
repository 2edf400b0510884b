//! Ports - the engine's view of the outside world.
//!
//! Each trait stands in for something the engine does not own: the
//! generation service, durable storage, time and id minting. The app layer
//! only ever talks to these traits.

pub mod artifact_store;
pub mod clock;
pub mod gateway;
pub mod id_generator;

pub use self::artifact_store::KeyValueStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::gateway::GenerationGateway;
pub use self::id_generator::{IdGenerator, TimestampIdGenerator};
