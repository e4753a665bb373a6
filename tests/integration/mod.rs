mod connection_test;
mod pipeline_test;
mod session_test;
