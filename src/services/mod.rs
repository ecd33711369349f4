pub mod broker;
pub mod policy;
pub mod storage;
pub mod sts;
pub mod uploader;
