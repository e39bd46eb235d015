// src/models.rs

pub mod auth;
pub mod materials;
pub mod rbac;
pub mod reports;
pub mod rooms;
pub mod vendors;
pub mod vouchers;
