//! Ring Buffer
//!
//! Fixed-capacity buffer that overwrites its oldest sample once full. Used for
//! the EAR history window and the moving-average smoothing window.

mod buffer;

pub use buffer::RingBuffer;
