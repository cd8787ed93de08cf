//! Audits and reports over finished matchings.

pub mod stability;
pub mod summary;
