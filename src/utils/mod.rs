pub mod paths;
pub mod terminal;

pub use paths::{default_data_dir, format_path_with_tilde};
pub use terminal::sanitize_for_terminal;
