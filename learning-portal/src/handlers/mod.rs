pub mod app;
pub mod content;
pub mod guardian;
