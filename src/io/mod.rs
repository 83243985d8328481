pub mod config_io;
pub mod document;
pub mod lock;
pub mod recovery;
pub mod session;
pub mod storage;
pub mod watcher;
