pub mod auth;
pub mod event;
pub mod handlers;

pub use auth::WebhookAuthenticator;
pub use event::{StarEventOutcome, STAR_ACTION};
pub use handlers::post_webhook;
