pub mod cache;
pub mod config;
pub mod db;
pub mod dto;
pub mod effects;
pub mod entity;
pub mod error;
pub mod geo;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod push;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
