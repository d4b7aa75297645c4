mod chat_message_test;
mod embedding_test;
mod meeting_status_test;
mod storage_path_test;
