//! Size-fitting encoder.
//!
//! Re-encodes at different widths until the output lands just under the
//! profile's byte limit, or can't usefully grow or shrink any further.

mod encoder;
mod search;

pub use encoder::{
    collect_frames, output_path_for, select_backend, EncodeError, EncodeOutcome, EncodeResult,
    EncodeSource, SizeFitEncoder,
};
pub use search::{EncodeTarget, WidthSearch, INITIAL_STEP};
