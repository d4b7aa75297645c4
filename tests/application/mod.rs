mod meeting_service_test;
mod worker_test;
