pub mod cmd_check;
pub mod cmd_parse;
pub mod common;
