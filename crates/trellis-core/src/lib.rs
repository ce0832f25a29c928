//! Trellis Core Types and Definitions
//!
//! This crate provides the foundational types shared by every Trellis crate:
//!
//! - **Model**: the read-only description of declared types, their members,
//!   supertypes and free-form tags ([`model`] module)
//! - **Relations**: relation kinds and the direction algebra used to merge
//!   repeated observations of the same relation ([`relation`] module)
//! - **Errors**: name lookup failures for the closed vocabularies
//!   ([`error::UnknownNameError`])

pub mod error;
pub mod model;
pub mod relation;
