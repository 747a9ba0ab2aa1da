//! Shared buffers between a Streamer (single writer) and any number of
//! readers, each holding a single-consumption event token.
//!
//! Both buffer types coalesce: a reader that misses several writes before
//! checking in only ever observes the latest value, never a backlog.

mod latest_slot;
mod ring;
mod token;

pub use latest_slot::LatestSlotBuffer;
pub use ring::GraphRingBuffer;
pub use token::EventToken;
