// src/services.rs

pub mod auth;
pub mod material_service;
pub mod rbac_service;
pub mod report_service;
pub mod room_cycle;
pub mod room_service;
pub mod stage_service;
pub mod user_service;
pub mod vendor_service;
pub mod voucher_service;
