mod node_tests;
mod version_tests;
