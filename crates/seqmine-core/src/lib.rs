//! # seqmine-core
//!
//! Constraint-based sequential pattern mining over multi-attribute
//! sequence databases.
//!
//! ## The problem
//!
//! Given sequences of events, each event carrying integer attribute
//! values (price, timestamp, quantity, ...), find every pattern of event
//! types that occurs as an ordered subsequence in at least `theta`
//! sequences *and* admits an occurrence satisfying a set of attribute
//! constraints: gap (between consecutive events), span (min-to-max range
//! over the pattern), average, and median. Only maximal patterns (those
//! with no frequent one-item extension) are reported, together with
//! their feasible-witness support.
//!
//! ## The approach
//!
//! The database is first encoded as a layered Multi-valued Decision
//! Diagram: one node per (position, item), one arc per gap-feasible
//! transition, with per-arc attribute summaries describing the best
//! feasible continuation. A depth-first enumerator then grows patterns
//! by consuming MDD children, and a four-valued constraint arbiter uses
//! the precomputed summaries to decide in O(1) whether an extension is
//! feasible now, dead forever, or worth deferring.
//!
//! ## Example
//!
//! ```
//! use seqmine_core::api::{Attribute, MinFrequency, PatternMiner};
//!
//! let mut miner = PatternMiner::new(vec![
//!     vec!["A", "A", "B", "A", "D"],
//!     vec!["C", "B", "A"],
//!     vec!["C", "A", "C", "D"],
//! ])
//! .unwrap();
//!
//! // Constrain the price attribute: consecutive pattern events may
//! // differ by at most 10.
//! let price = miner
//!     .add_attribute(Attribute::new(vec![
//!         vec![5, 5, 3, 8, 2],
//!         vec![1, 3, 3],
//!         vec![4, 5, 2, 1],
//!     ]).unwrap())
//!     .unwrap();
//! miner.add_constraint(price.gap().le(10)).unwrap();
//!
//! let patterns = miner.mine(MinFrequency::Count(2)).unwrap();
//! assert!(patterns.iter().all(|p| p.frequency >= 2));
//! ```
//!
//! The raw parameter block ([`MiningParams`] + [`mine`]) is available
//! for callers that derive constraints themselves.

mod arbiter;
mod builder;
mod error;
mod miner;
mod node;
mod params;
mod pattern;
mod summary;

pub mod api;

pub use error::MiningError;
pub use miner::mine;
pub use params::MiningParams;
