pub mod identity;
pub mod job_secret;
