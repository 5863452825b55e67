pub mod message;

pub use message::{MessageRecord, StatsRecord};
