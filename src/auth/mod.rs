pub mod middleware;
pub mod provider;
pub mod session;
pub mod validate;
