//! Hosted backend: PostgREST table access plus the auth user endpoint.

pub mod auth;
pub mod client;
pub mod repository;
pub mod rows;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use repository::RemoteRepository;
