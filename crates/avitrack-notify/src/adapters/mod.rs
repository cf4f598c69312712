pub mod email;
pub mod local;
pub mod push;

pub use email::{EmailAdapter, EmailSettings};
pub use local::LocalLogAdapter;
pub use push::{PushAdapter, PushSettings};
