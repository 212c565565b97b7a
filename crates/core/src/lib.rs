//! Verso core: topic labelling, version numbering and validation.
//!
//! Everything in this crate is pure; persistence lives in `verso-db`.

pub mod error;
pub mod numbering;
pub mod topic;
pub mod types;
pub mod version;
