//! Coffer core: owner records and their file attachments.
//!
//! Owner records live in a key-value record store; attachment content lives
//! in an object store under `{owner_id}/{name}`. This crate holds the rules
//! that keep the two in step, behind the [`owner::RecordStore`] and
//! [`storage::ObjectStore`] traits. No web or database dependencies.

pub mod attachment;
pub mod auth;
pub mod outbound;
pub mod owner;
pub mod storage;

#[cfg(test)]
mod test_support;
