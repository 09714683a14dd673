use crate::application::use_cases::extraction::DocumentExtraction;

impl DocumentExtraction {
    pub(in crate::application::use_cases::extraction) fn extract_txt(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).trim().to_string()
    }
}
