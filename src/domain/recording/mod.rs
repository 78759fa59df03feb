//! Recording domain module

mod chunks;
mod duration;
mod format;
mod result;

pub use chunks::ChunkBuffer;
pub use duration::Duration;
pub use format::{RecordingFormat, FORMAT_PREFERENCE};
pub use result::{suggested_file_name, RecordingResult};
