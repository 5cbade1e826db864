//! Domain model for Taskdeck.
//!
//! Defines the task document as it lives in the remote collection, the
//! user identity types reported by the identity provider, and the local
//! validation applied before any create request leaves the client.

pub mod task;
pub mod user;
