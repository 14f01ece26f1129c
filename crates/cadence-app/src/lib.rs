pub mod app;
pub mod config;
pub mod context_handler;
pub mod error;
pub mod middleware;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;
