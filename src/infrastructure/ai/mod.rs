mod gemini_gateway;
mod response_parser;

pub use gemini_gateway::GeminiGateway;
pub use response_parser::parse_analysis;
