pub mod document;
pub mod error;
pub mod metrics;
pub mod quota;
