mod common;
mod consistency;
