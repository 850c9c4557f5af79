pub mod auth;
pub mod bulk;
pub mod repo;
pub mod template_ops;
pub mod transfer;
pub mod undo;
pub mod view;
