mod membership_tests;
mod pipeline_tests;
mod signalling_tests;
