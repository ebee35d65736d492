pub mod imaging;
pub mod persistence;
pub mod storage;
