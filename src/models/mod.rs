pub mod attendance;
pub mod meeting;
pub mod request;
pub mod role;
pub mod user;
pub mod voting;
