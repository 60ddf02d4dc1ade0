pub mod postgres;

#[cfg(any(feature = "test_utils", test))]
pub mod memory;
