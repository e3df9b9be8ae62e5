pub mod message;
pub mod session;
pub mod stream;

pub use message::decode_message;
pub use session::SignalSession;
pub use stream::{Backoff, FeedStream};
