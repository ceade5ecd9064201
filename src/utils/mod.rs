pub mod arg_aliases;
pub mod data_path;
pub mod duration;
pub mod fs_atomic;
pub mod template;
pub mod text;
pub mod user_paths;
