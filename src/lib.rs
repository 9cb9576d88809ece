pub mod core;
pub mod llm;
pub mod logging;
pub mod rag;
pub mod server;
pub mod state;
pub mod web;
