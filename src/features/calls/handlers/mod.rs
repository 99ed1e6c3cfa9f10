mod call_handler;

pub use call_handler::*;
