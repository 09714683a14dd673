mod csv;
mod docx;
mod html;
mod json;
mod markdown;
mod pdf;
mod pptx;
mod txt;
mod xlsx;
