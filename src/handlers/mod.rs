//! HTTP request handlers.

mod chat;
mod health;
mod models;
pub mod problem_details;
mod sessions;

pub use chat::chat;
pub use health::health;
pub use models::list_models;
pub use sessions::{
    add_file, create_session, delete_session, get_file_content, get_files, list_sessions,
};
