pub mod gateway;

pub use gateway::ProcessorGateway;
