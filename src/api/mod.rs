pub mod auth;
pub mod client;
pub mod events;
pub mod files;
pub mod participants;
pub mod users;

pub use client::{EntityApi, UpstreamError};
