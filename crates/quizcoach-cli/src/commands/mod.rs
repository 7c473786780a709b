pub mod courses;
pub mod ingest;
pub mod init;
pub mod list_models;
pub mod play;
pub mod validate;
