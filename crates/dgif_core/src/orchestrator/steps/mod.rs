//! Pipeline step implementations.
//!
//! Each step handles one phase of turning an input into a size-limited asset.

mod crop;
mod encode;
mod frames;
mod inspect;
mod sequence;

pub use crop::CropStep;
pub use encode::EncodeStep;
pub use frames::FramesStep;
pub use inspect::InspectStep;
pub use sequence::SequenceStep;
