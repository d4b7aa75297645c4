mod chat;
mod health;
mod meetings;
mod task_status;

pub use chat::{chat_handler, chat_history_handler};
pub use health::health_handler;
pub use meetings::{
    create_meeting_handler, get_meeting_handler, list_meetings_handler, search_meetings_handler,
};
pub use task_status::task_status_handler;
