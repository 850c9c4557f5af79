pub mod chat;
pub mod config;
pub mod task;
pub mod template;
pub mod view;

pub use chat::*;
pub use config::*;
pub use task::*;
pub use template::*;
pub use view::*;
