pub mod completion;

pub use completion::{CompletionRequest, CompletionResponse};
