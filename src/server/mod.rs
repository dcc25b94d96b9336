//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        request id · tracing · security headers · etag ·         │
//! │               error translation · panic catching                │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │ middleware  │  │        routes           │  │
//! │  │ (pages, LTI)│  │ (per req.)  │  │ (router config, CORS)   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{
    home_handler, init_handler, jwks_handler, launch_handler, names_and_roles_handler,
    not_found_handler, redirect_handler, registration_finish_handler, registration_handler,
    sign_deep_link_handler, up_handler, AppState, ErrorReport, ErrorResponse, RequestContext,
    UpResponse,
};
pub use routes::{create_router, RouterConfig};
