//! Messaging Module
//!
//! This module holds the direct-messaging core on the server side:
//!
//! - **`store`** - `MessageStore` trait and the in-memory store
//! - **`directory`** - user directory and post snapshot seams
//! - **`db`** - PostgreSQL implementations of all three seams
//! - **`broker`** - persist-then-fan-out delivery
//! - **`read_state`** - read acknowledgements
//! - **`handlers`** - REST endpoints

pub mod broker;
pub mod db;
pub mod directory;
pub mod handlers;
pub mod read_state;
pub mod store;

pub use broker::{DeliveryBroker, DeliveryReport};
pub use directory::{MemoryPostSnapshots, MemoryUserDirectory, PostSnapshots, UserDirectory};
pub use read_state::ReadStateTracker;
pub use store::{MemoryMessageStore, MessageStore};
