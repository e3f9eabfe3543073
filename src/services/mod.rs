pub mod expiry;
pub mod quota;
pub mod token_service;
