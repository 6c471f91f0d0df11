mod native;
mod recording;
mod shell;

pub use self::native::NativeDriver;
pub use self::recording::{RecordedQuery, RecordingDriver, RecordingResponseBuilder};
pub use self::shell::ShellDriver;
