pub mod blob_delete;
pub mod document_download;
pub mod document_get;
pub mod download_selected;
pub mod health;
pub mod signed_url;
mod zip_response;
