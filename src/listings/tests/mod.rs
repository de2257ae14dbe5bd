mod common;
mod completeness;
mod media;
