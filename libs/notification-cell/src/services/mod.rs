pub mod dispatcher;
pub mod templates;
pub mod transport;
