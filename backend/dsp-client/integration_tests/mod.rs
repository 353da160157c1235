mod device_tests;
mod error;
