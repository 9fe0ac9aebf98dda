pub mod bulk;
pub mod downloads;
pub mod formats;
pub mod ingest;
pub mod packing;
pub mod sequence;
pub mod size;
