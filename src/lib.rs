//! Real-time flight-state computation for gliders.
//!
//! A [`flight_control::GlideComputer`] consumes position fixes, derives the flight state in a
//! fixed pipeline of stages and publishes it on a [`blackboard::Blackboard`]. Long-lived
//! subsystems shared with UI threads (the task manager and the airspace warning manager) sit
//! behind [`blackboard::Protected`] leases. [`keychain::Keychain`] bundles all shared handles.
#![allow(clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]

mod logger;
pub mod airspace;
pub mod blackboard;
pub mod flight_control;
pub mod keychain;
pub mod settings;
