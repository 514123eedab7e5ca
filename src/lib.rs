// doccache-chat - Browser chat over a Gemini context-cached document
// Author: kelexine (https://github.com/kelexine)

pub mod cache;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod query;
pub mod server;
pub mod utils;
