pub mod quiz;
pub mod response;
pub mod stream;
