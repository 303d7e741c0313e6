pub mod account_dto;
pub mod application_dto;
pub mod drive_dto;
pub mod event_dto;
pub mod job_dto;
pub mod notification_dto;
pub mod profile_dto;
