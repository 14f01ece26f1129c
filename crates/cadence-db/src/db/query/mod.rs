pub mod event;
pub mod group;
