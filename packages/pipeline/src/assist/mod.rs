mod assistant;
mod prompt;

pub use assistant::{parse_assist_result, AssistRequest, ResponseAssistant};
