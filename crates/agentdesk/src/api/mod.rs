//! Local HTTP/WebSocket surface over [`Commands`](crate::commands::Commands).
//!
//! Every route answers HTTP 200 with the plain result value; failures are
//! carried in the body as `success: false` with `error` and `code`. Requests
//! from a browser origin outside [`OriginPolicy`] get 403 before reaching
//! any route.

mod handlers;
mod origins;
mod routes;
mod state;
mod ws;

pub use origins::OriginPolicy;
pub use routes::create_router;
pub use state::AppState;
