pub(crate) mod common;
mod memory;
