//! Integration tests for the treesync replication core

mod config_integration;
mod fingerprint;
mod move_rewrite;
mod snapshot_diff;
mod test_utils;
