mod builder_tests;
mod classifier_tests;
mod counter_tests;
mod quoting_tests;
mod reply_tests;
