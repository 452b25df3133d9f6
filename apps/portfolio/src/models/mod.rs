pub mod content;
pub mod identifier;
pub mod inbox;
pub mod session;
