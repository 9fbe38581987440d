pub mod github;
pub mod push;

pub use github::{Repository, Sender, StarEvent};
pub use push::{Notification, Subscription};
