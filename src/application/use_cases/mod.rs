pub mod extraction;
pub mod format_detector;
pub mod ocr_chain;
pub mod quota;
pub mod sufficiency;
pub mod tabular_sampler;
