pub mod table;
pub mod checkpoint;

pub use table::{
    load_all, load_reviews, output_columns, read_analysis, write_analysis, write_per_platform,
};
pub use checkpoint::{CheckpointCursor, CheckpointStore};
