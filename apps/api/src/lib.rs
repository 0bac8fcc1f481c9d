pub mod config;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod routes;
pub mod state;
