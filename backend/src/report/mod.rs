pub mod models;
pub mod report_service;
