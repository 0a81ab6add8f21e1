// Interface adapters: in-memory world, history stores and the HTTP/WS surface.

pub mod history;
pub mod http;
pub mod net;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod utils;
pub mod world;
