//! # Revid Codec
//!
//! The codec engine seam and the reusable codec pump.
//!
//! The codec engine itself (the entity performing actual bitstream decode
//! and encode) is an external capability: this crate defines the
//! buffer-queue protocol it must expose ([`CodecInstance`],
//! [`CodecEngine`]) and the engine-agnostic pump ([`CodecPump`]) that
//! drives one instance from a data source to a data sink until output
//! end-of-stream.

pub mod cancel;
pub mod pump;
pub mod traits;

pub use cancel::CancelToken;
pub use pump::{CodecPump, DrainPolicy, PumpConfig, PumpStats};
pub use traits::{
    CodecDirection, CodecEngine, CodecInstance, InputSlot, OutputSlot, UnitSink, UnitSource,
};
