pub mod cloud;
pub mod preprocess;
pub mod tesseract;

pub use cloud::CloudOcrBackend;
pub use tesseract::TesseractBackend;
