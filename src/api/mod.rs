pub mod attendance;
pub mod employee;
pub mod late_reason;
pub mod report;
