//! Authentication flow: provider endpoints and the session
//! controller.

mod endpoints;
mod flow;

pub use flow::{AuthFlow, AuthFlowBuilder, FlowState};
