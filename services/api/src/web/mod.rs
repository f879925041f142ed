pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible to the binary that
// builds the web server router.
pub use rest::{
    end_interview_handler, get_report_handler, init_interview_handler, list_interviews_handler,
    save_interview_handler, send_message_handler, session_status_handler,
};
