pub mod pdf_service;
pub mod person_service;

pub use pdf_service::{download_pdf, DownloadError};
pub use person_service::query_full_info;
