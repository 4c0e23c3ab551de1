//! Application Layer
//!
//! Hook configuration, hook dispatch, and the adapter tying them to the
//! peer registry.

pub mod adapter;
pub mod dispatcher;
pub mod hooks;

pub use adapter::{Adapter, AdapterOptions, NamespaceFn};
pub use dispatcher::{HookCall, HookDispatcher, UpgradeResult};
pub use hooks::{resolver, Hook, HookEvent, HookFuture, HookSet, Resolver};
