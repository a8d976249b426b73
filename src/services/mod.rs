pub mod access;
pub mod init;
pub mod invites;
pub mod profiles;
pub mod shares;
