//! Configuration constants for the engine.
//!
//! Everything layout-related lives in [`constants`]; import from here
//! rather than redefining values locally.

mod constants;

pub use constants::{
    AVG_ATTR_BYTES, DATA_FILE_EXTENSION, HASH_BITS, INFO_FILE_EXTENSION, MAX_CHOICE_BITS, NO_PAGE,
    OVFLOW_FILE_EXTENSION, PAGE_BODY_SIZE, PAGE_HEADER_SIZE, PAGE_SIZE,
};
