mod health_tests;
mod media_tests;
