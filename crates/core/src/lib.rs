//! Core utilities shared by the solnorm crates.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod error;
pub mod utils;

#[cfg(feature = "test-utils")]
pub mod test_utils;
