//! Events flowing from the persistence layer into the feed

mod feed_event;

pub use feed_event::FeedEvent;
