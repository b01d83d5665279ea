pub mod auth;
pub mod config;
pub mod extractors;
pub mod game;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;
