//! HTTP inbound adapter: session sealing, gates, dispatch, and error mapping.
//!
//! Request flow: [`dispatch`] resolves the route and method, [`session_store`]
//! unseals the cookie, [`gate`] decides admission, the handler runs, and
//! [`error`] renders any failure.

pub mod dispatch;
pub mod error;
pub mod gate;
pub mod session_config;
pub mod session_routes;
pub mod session_store;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
