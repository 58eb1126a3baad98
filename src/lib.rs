//! 服务目录
//! 应用下的服务与服务模版管理

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
