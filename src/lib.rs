pub mod authentication;
pub mod config;
pub mod domain;
pub mod email_client;
pub mod error;
pub mod repository;
pub mod routes;
pub mod services;
pub mod startup;
pub mod telemetry;
