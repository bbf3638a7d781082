pub mod clipboard;
pub mod services;
pub mod storage;
