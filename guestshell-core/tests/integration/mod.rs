mod common;
mod interactive_session_tests;
mod process_tests;
mod remote_session_tests;
mod settings_tests;
