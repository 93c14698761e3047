//! End-to-end tests at the index API level.
//!
//! Each test file covers a specific scenario, driving a [`BTreeIndex`]
//! over a real block store and checking the resulting tree.
//!
//! [`BTreeIndex`]: crate::btree::BTreeIndex

#![cfg(test)]

mod helpers;

mod test_attach;
mod test_basic_scenario;
mod test_corruption;
mod test_display;
mod test_growth;
mod test_no_space;
mod test_persistence;
mod test_random_order;
mod test_split_correctness;
mod test_uniqueness;
mod test_update;
