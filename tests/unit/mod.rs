pub mod builder_tests;
pub mod concurrency_tests;
pub mod config_tests;
pub mod render_tests;
pub mod scenario_tests;
pub mod version_tests;
pub mod vocabulary_tests;
pub mod workflow_tests;
