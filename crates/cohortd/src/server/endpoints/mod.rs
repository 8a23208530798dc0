pub mod batch;
pub mod sessions;
pub mod status;
