pub mod bench;
pub mod init;
pub mod schedule;
