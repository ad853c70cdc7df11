pub mod connection;

pub use connection::LspConnection;
