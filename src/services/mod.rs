pub mod audit_service;
pub mod authorization;
pub mod capacity_guard;
pub mod notification_service;
pub mod workflow;
