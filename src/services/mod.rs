pub mod ingestion_service;
pub mod ranking_service;
pub mod report_service;
