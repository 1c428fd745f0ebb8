//! Bot module handlers.
//!
//! This module contains the Module trait and registry for dispatching
//! classified intents to the modules that answer them. The built-in modules
//! themselves live in [`crate::modules`].

pub mod core;

pub use self::core::{
    Context, DispatchOutcome, Dispatcher, Help, LineKind, Module, ModuleConfig, ModuleDescriptor,
    Outbound, OutputBatcher, OutputBuffer, Registry, ResponseMiddleware, SendError, Services,
};
