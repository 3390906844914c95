//! Signal declarations exchanged with the host
//!
//! This module describes which logical signals each analyzer variant reads
//! and resolves host-supplied traces into a [`crate::trace::TraceSet`].

pub mod declaration;

// Re-export key types for convenience
pub use declaration::{common_declarations, resolve_traces, SignalDeclaration, SignalRole};
