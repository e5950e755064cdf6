mod session;
mod service;

pub use service::{ChannelFeed, LocationFeed, RecordingHandle};
pub use session::{PathSession, SessionState};
