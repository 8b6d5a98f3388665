pub mod auth;
pub mod gemini;
pub mod generation;
pub mod prompt;
pub mod rate_limit;
