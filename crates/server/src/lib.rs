pub mod error;
pub mod routes;
pub mod server;

pub use error::{ServerError, ServerResult};
pub use pictor_core::PictorConfig;
pub use routes::{create_router, AppState};
pub use server::Server;
