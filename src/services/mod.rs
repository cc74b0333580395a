pub mod quota_service;
pub mod asset_service;
pub mod collection_service;
pub mod storage_service;
pub mod verification_service;
pub mod pipeline;

pub use pipeline::run_pipeline;
