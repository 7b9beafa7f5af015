//! Value objects - immutable types that represent domain concepts

mod connection_id;
mod match_id;

pub use connection_id::ConnectionId;
pub use match_id::MatchId;
