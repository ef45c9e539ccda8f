//! DHCPv4 client protocol engine (RFC 2131, RFC 2132).
//!
//! A transport-free implementation of the DHCP client side: the wire codec,
//! the per-interface state machine with exponential-backoff retransmission,
//! T1/T2 lease maintenance, and a manager running any number of interfaces
//! off a single deadline. All I/O, addressing, time, and randomness go
//! through the [`Platform`] trait supplied by the embedder.
//!
//! Typical embedding:
//!
//! ```ignore
//! let mut manager = DhcpManager::new(platform, ManagerConfig::default());
//! manager.start(ifindex);
//! loop {
//!     let deadline = manager.next_deadline();
//!     // sleep until `deadline` or a packet arrives, then:
//!     manager.handle_packet(ifindex, &payload, src);
//!     manager.tick();
//!     for event in manager.take_events() {
//!         log::info!("{event}");
//!     }
//! }
//! ```

pub mod client;
pub mod error;
pub mod manager;
pub mod options;
pub mod platform;
pub mod wire;

pub use client::{Client, DhcpState};
pub use error::Error;
pub use manager::{DhcpEvent, DhcpManager, ManagerConfig};
pub use options::{MAX_REQUESTED_OPTIONS, OptionHandler};
pub use platform::Platform;
