// Storage backends / 存储后端
pub mod s3;
