pub mod auth_service;
pub mod contact_service;
pub mod health_service;
pub mod rate_limit_service;
