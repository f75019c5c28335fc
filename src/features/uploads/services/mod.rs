mod quality_service;

pub use quality_service::QualityService;
