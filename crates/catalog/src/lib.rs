//! `lotledger-catalog` — catalog items and their embedded lots.

pub mod item;

pub use item::{AppliedDelta, BomComponent, Item, ItemType, Lot};
