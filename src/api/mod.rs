pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{create_function_router, create_router, create_server_router};
