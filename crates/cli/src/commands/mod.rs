pub mod app;
pub mod ping;
pub mod solo;
