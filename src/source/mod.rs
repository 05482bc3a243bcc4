//! Inbound invocation payloads and scratch storage

pub mod event;
pub mod scratch;

pub use event::{InvocationRequest, ProxyRequest, ProxyResponse, RequestContext};
pub use scratch::ScratchFile;
