pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod stage_repo;
pub use stage_repo::StageRepository;
pub mod room_repo;
pub use room_repo::RoomRepository;
pub mod vendor_repo;
pub use vendor_repo::VendorRepository;
pub mod material_repo;
pub use material_repo::MaterialRepository;
pub mod voucher_repo;
pub use voucher_repo::VoucherRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
