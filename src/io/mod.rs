mod local;

pub use local::{create_output_dir, default_output_dir, read_entire_file, write_entire_file};
