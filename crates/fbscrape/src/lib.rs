//! fbscrape: extract friends, profile fields, timeline posts, likes and
//! presence from the mobile basic site and normalize them into JSON.

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod input;
pub mod model;
pub mod normalize;
pub mod report;
pub mod snapshot;

pub use aggregate::{merge, KeyedCollection, LikeCollection, Merge, PostCollection, PresenceLog};
pub use assemble::Assembler;
pub use config::{CacheMode, ScraperConfig, SessionCookies};
pub use error::{MissingCause, ScrapeError, ScrapeResult};
pub use http::{Fetcher, MemorySource, PageSource};
pub use input::parse_entity_keys;
pub use model::{FriendEntry, LikeEvent, Post, ProfileFields};
pub use report::Scraper;
