//! Input validation and ordering.

pub mod selection;

pub use selection::{
    check_unique, date_token, order_newest_first, partition, select_files, OrderedFiles,
    SelectionError, MAX_FILES_PER_KIND,
};
