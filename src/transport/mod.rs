pub mod http_transport;
pub mod shutdown;

pub use http_transport::HttpTransport;
pub use shutdown::shutdown_signal;
