pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod links;
pub mod mail;
pub mod middleware;
pub mod reports;
pub mod resources;
pub mod routes;
pub mod state;
