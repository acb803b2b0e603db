pub mod core_auth;
pub mod helper;

pub use core_auth::{AuthState, CredentialTable, PasswdEntry};
pub use helper::{hash_password, load_passwd_file, verify_password};
