pub mod doubles;
pub mod fixtures;

pub use doubles::{FlakyStore, RecordingAccessControl, RecordingNotifier};
pub use fixtures::*;
