// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! lachesis-proxy: the deterministic core of the application replication interface.
//!
//! Blocks, the BLAKE3 state-hash chain and the reference hash-chain application.
//! No I/O and no async; the adapters live in `lachesis-node`.

pub mod app;
pub mod block;
pub mod error;
pub mod hash;
pub mod state;

pub use app::Application;
pub use block::{Block, Snapshot, Transaction};
pub use error::{StateError, StateResult};
pub use hash::StateHash;
pub use state::ChainState;
