//! Application services

pub mod resource_service;

pub use resource_service::ResourceService;
