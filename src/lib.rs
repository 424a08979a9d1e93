//! chainderive: Availability-Filtered Derived Queries
//!
//! Composes the derived-query namespace of a chain API client. Groups of derive
//! methods are filtered against what the connected chain actually exposes, and
//! each surviving method is constructed lazily on first use and memoized for the
//! lifetime of the client.
//!
//! ```
//! use chainderive::{
//!     compose, AvailabilityTable, CallerId, GroupRegistry, MethodTable, StaticChainContext,
//! };
//! use std::sync::Arc;
//!
//! let builtin = GroupRegistry::new().with_group(
//!     "society",
//!     MethodTable::new().with_method("info", |id, _ctx| Ok(format!("society info for {}", id))),
//! );
//! let ctx = Arc::new(StaticChainContext::new("kusama").with_query_key("society"));
//!
//! let derived = compose(
//!     &builtin,
//!     &GroupRegistry::new(),
//!     &AvailabilityTable::builtin(),
//!     &CallerId::new("client-1"),
//!     &ctx,
//! );
//! assert_eq!(derived.method("society", "info").unwrap(), "society info for client-1");
//! ```

pub mod availability;
pub mod chain;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod lazy;
pub mod logging;
pub mod registry;
pub mod types;

pub use availability::{Availability, AvailabilityRule, AvailabilityTable, BUILTIN_GROUPS};
pub use chain::{ChainContext, StaticChainContext};
pub use compose::{compose, Composer, DerivedObject, GroupOrigin};
pub use error::DeriveError;
pub use lazy::LazyGroup;
pub use registry::{Factory, GroupRegistry, MethodTable};
pub use types::CallerId;
