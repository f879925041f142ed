pub mod chat_llm;
pub mod db;
pub mod report_llm;
pub mod resume;
