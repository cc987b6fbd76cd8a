//! # Revid Core
//!
//! Core types for the revid re-encoding library.
//!
//! This crate provides the building blocks shared by all revid components:
//! - Error handling types
//! - Stream format descriptors
//! - Frame records and their sidecar encoding
//! - Transfer units flowing through the codec pumps

pub mod error;
pub mod format;
pub mod record;
pub mod unit;

pub use error::{Error, ErrorKind, Result};
pub use format::FormatDescriptor;
pub use record::{FrameRecord, RecordFlags};
pub use unit::{SlotFlags, Unit};
