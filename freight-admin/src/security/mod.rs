pub mod crypto;
pub mod secret_protector;
pub mod session_store;
pub mod token;
