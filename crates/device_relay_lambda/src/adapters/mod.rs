pub mod http;
pub mod reqwest_transport;
