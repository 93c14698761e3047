#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
// Blocktree: a disk-backed B+tree index over a block store.
//
// Layers, bottom to top:
//  - store: fixed-size block I/O (file-backed or in-memory with faults)
//  - btree: node codec, free-list allocator, search, insert, checker
//  - config: environment-driven settings for the inspector binary

pub mod btree;
pub mod config;
pub mod store;

mod e2e_tests;
