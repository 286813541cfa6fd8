// Public modules
pub mod chat_request;
pub mod chat_response;
pub mod feedback_request;
pub mod language;
pub mod message;
pub mod product;
pub mod source;
pub mod stream_event;

// Re-exports
pub use chat_request::ChatRequest;
pub use chat_response::ChatResponse;
pub use feedback_request::FeedbackRequest;
pub use language::Language;
pub use message::{APOLOGY_TEXT, Message, MessageId, Role};
pub use product::{Product, selection_label};
pub use source::Source;
pub use stream_event::{StreamEnd, StreamEvent, StreamMetadata};
