pub mod client_ip;
pub mod fields;
pub mod parser;
pub mod workflow;
