//! Owner records and the record service.
//!
//! An owner record holds a profile, login credentials, and the metadata of
//! every attachment the owner has uploaded. The record is always read and
//! written as a whole.

mod error;
mod service;
mod store;
mod types;


pub use error::{OwnerError, WriteStep};
pub use service::RecordService;
pub use store::{PageToken, PutCondition, RecordFilter, RecordStore, RecordStoreError, ScanPage};
pub use types::{
    CredentialCheck, Credentials, NewOwner, OWNER_SORT_KEY, OwnerRecord, Profile, PublicProfile,
    fields,
};
