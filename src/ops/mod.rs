pub mod archive_ops;
pub mod backup;
pub mod confirm;
pub mod edit;
pub mod group_ops;
pub mod task_ops;
