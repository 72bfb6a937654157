mod fetch;
mod parse;

pub use fetch::{fetch_episodes, fetch_feed};
pub use parse::{parse_feed, Enclosure, Episode};
