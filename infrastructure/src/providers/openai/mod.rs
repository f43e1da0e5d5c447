//! OpenAI adapters.

mod gateway;
mod images;
mod session;
pub(crate) mod types;

pub use gateway::OpenAiGateway;
pub use images::OpenAiImageGenerator;
pub use session::OpenAiSession;
