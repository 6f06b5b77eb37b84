pub mod call_dispatcher;
pub mod state_reporter;
