mod mapper;
mod transport;

pub use transport::BotApiTransport;
