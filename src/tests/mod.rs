mod batch_tests;
mod report_tests;
mod rust_api_tests;
mod sheet_tests;
