//! Recognition storage for the species recognition backend
//!
//! This crate provides the DynamoDB-backed gateway for persisted recognition
//! records: a conditional insert that detects sort-key collisions and a
//! newest-first history query.

pub mod recognition;
