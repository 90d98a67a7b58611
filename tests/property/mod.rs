//! Property-based tests for translation and fingerprint guarantees

mod determinism;
