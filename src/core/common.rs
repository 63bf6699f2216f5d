pub mod http_client_factory;
pub mod transport;
