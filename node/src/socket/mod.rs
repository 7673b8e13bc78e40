// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Dual-socket adapters.
//!
//! Each process is both RPC server and RPC client, on two separate
//! addresses, so inbound submissions never queue behind outbound commits:
//!
//! ```text
//! consensus process                      application process
//! SocketAppProxy                         SocketConsensusProxy
//!   RpcClient  --- client_addr --->        RpcServer (commit/snapshot/restore)
//!   RpcServer  <--- proxy_addr ----        RpcClient (SubmitTx)
//! ```

pub mod app_proxy;
pub mod consensus_proxy;

pub use app_proxy::SocketAppProxy;
pub use consensus_proxy::SocketConsensusProxy;
