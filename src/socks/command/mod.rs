//! SOCKS5 request parsing and reply construction.

mod parser;
mod reply;

pub use parser::parse_request;
pub use reply::{
    associate_reply_bytes, connect_reply_bytes, send_associate_reply, send_connect_reply,
};
