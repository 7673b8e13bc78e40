// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod inmem;
pub mod proxy;
pub mod rpc;
pub mod socket;
pub mod submit;
pub mod telemetry;
pub mod wire;

pub use config::ProxyConfig;
pub use errors::ProxyError;
pub use inmem::InmemAppProxy;
pub use proxy::AppProxy;
pub use socket::{SocketAppProxy, SocketConsensusProxy};
pub use submit::{SubmitHandle, SubmitStream};
