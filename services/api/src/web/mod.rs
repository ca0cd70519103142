pub mod course_outlines;
pub mod messages;
pub mod middleware;
pub mod question_sets;
pub mod rest;
pub mod router;
pub mod state;
pub mod users;

// Re-export the router builder to make it easily accessible
// to the binary that serves it.
pub use router::build_router;
pub use state::AppState;
