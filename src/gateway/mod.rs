//! HTTP server exposing the datatables bridge

mod router;
mod server;

pub use router::{AppState, create_router};
pub use server::Gateway;
