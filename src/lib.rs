//! An in-memory order-statistic B-tree over distinct positive integers.
//!
//! [`btree`] holds the augmented tree itself (search, insert, delete,
//! rank, select, and range enumeration). [`primality`] is a small
//! Miller-Rabin oracle used by the prime-range query. [`driver`] and
//! [`error`] belong to the command-line front end and are not needed by a
//! library consumer that only wants the tree.

pub mod btree;
pub mod driver;
pub mod error;
pub mod primality;

pub use btree::BTree;
