//! labtrack: laboratory equipment and wear-part tracking
//!
//! Keeps an inventory of consumables and wear parts, tracks the parts
//! installed on each machine against their service life, and raises
//! notifications when a part nears or passes the end of its life.

pub mod cli;
pub mod core;
pub mod entities;
