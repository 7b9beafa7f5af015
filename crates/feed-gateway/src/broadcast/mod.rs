//! Event broadcasting
//!
//! Fan-out of server-originated events to every connection or to the
//! subscribers of one match.

mod broadcaster;
mod dispatcher;

pub use broadcaster::Broadcaster;
pub use dispatcher::{ChannelPublisher, EventDispatcher, DEFAULT_PUBLISH_CAPACITY};
