mod client_tests;
mod template_lexer_tests;
mod utils;
mod variable_inference_tests;
