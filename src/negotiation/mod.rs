pub mod approval;
pub mod cancellation;
