mod prompt_sanitizer_test;
mod response_parser_test;
mod task_queue_test;
