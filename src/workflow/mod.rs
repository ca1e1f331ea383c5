pub mod session_ctx;
pub mod session_flow;

pub use session_ctx::SessionCtx;
pub use session_flow::SessionFlow;
