pub mod gemini;
pub mod notion;
pub mod openai;
