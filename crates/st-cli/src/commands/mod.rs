//! CLI command implementations

pub(crate) mod init;
pub(crate) mod run;
pub(crate) mod validate;
