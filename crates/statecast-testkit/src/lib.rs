//! # Statecast Testkit
//!
//! Testing utilities for statecast.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Recorders**: Hook sets that record every observability signal
//! - **Fixtures**: Replicas on a shared in-memory medium with controllable clocks
//! - **Generators**: Proptest strategies for snapshots and wire messages
//!
//! ## Test Fixtures
//!
//! ```rust
//! use serde_json::json;
//! use statecast_testkit::fixtures::{snapshot, TestNetwork};
//!
//! let network = TestNetwork::new(1_000);
//! let mut b = network.replica("chan", snapshot(json!({ "x": 1 })));
//! let mut a = network.replica("chan", snapshot(json!({ "x": 0 })));
//!
//! network.settle(&mut [&mut a, &mut b]);
//! assert_eq!(a.state().get("x"), Some(&json!(1)));
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use statecast_testkit::generators::wire_value;
//!
//! proptest! {
//!     #[test]
//!     fn decode_never_panics(value in wire_value()) {
//!         let _ = statecast_core::decode(&value);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod recorder;

pub use fixtures::{snapshot, TestNetwork, TestReplica};
pub use recorder::{HookRecorder, Recorded};
