pub mod auth;

pub use auth::{AuthenticatedUser, BearerIdentity, Claims, Requester};
