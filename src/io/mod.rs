// Input ingestion module

pub mod pose_file;

pub use pose_file::*;
