//! Subdivision surfaces for the Geolis CAD kernel.
//!
//! A [`Subd`] holds a stack of levels produced by Catmull–Clark or
//! Loop–Warren refinement. Level 0 is built with
//! [`operations::creation::MakeSubd`], edited with the operations in
//! [`operations::editing`], refined with [`subdivision::Subdivide`], checked
//! with [`validation`], persisted with [`archive`] and handed to
//! tessellation through [`export`].

pub mod archive;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod math;
pub mod operations;
pub mod sector;
pub mod subd;
pub mod subdivision;
pub mod topology;
pub mod validation;

pub use error::{Result, SubdError};
pub use subd::{Subd, SubdConfig};
