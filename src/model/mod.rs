pub mod employee;
pub mod event;
pub mod late_reason;
pub mod report;
pub mod role;
