mod exports_tests;
mod graph_tests;
