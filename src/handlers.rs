// src/handlers.rs

pub mod auth;
pub mod dashboard;
pub mod materials;
pub mod rbac;
pub mod reports;
pub mod rooms;
pub mod stages;
pub mod users;
pub mod vendors;
pub mod vouchers;
