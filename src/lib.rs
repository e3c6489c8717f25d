// Library exports for the moments server
// Integration tests drive the router and schema through these modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod graphql;
pub mod moments;
pub mod routes;
pub mod state;
pub mod users;
