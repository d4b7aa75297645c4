use std::time::Duration;

use minutes::application::ports::{QueueTaskStatus, TaskDisposition, TaskQueue};
use minutes::domain::{MeetingId, ProcessingTask, StoragePath};
use minutes::infrastructure::persistence::InMemoryTaskQueue;

const LONG_LEASE: Duration = Duration::from_secs(600);

fn task() -> ProcessingTask {
    let meeting_id = MeetingId::new();
    ProcessingTask::new(
        meeting_id,
        StoragePath::new(&meeting_id, "call.webm"),
        "audio/webm".to_string(),
    )
}

#[tokio::test]
async fn given_enqueued_task_when_pulled_then_leased_with_first_attempt() {
    let queue = InMemoryTaskQueue::new(3);
    let task = task();
    let task_id = task.id;
    queue.enqueue(task).await.unwrap();

    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();

    assert_eq!(leased.task.id, task_id);
    assert_eq!(leased.attempt, 1);

    let state = queue.get_state(task_id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Leased);
}

#[tokio::test]
async fn given_active_lease_when_pulled_again_then_nothing_returned() {
    let queue = InMemoryTaskQueue::new(3);
    queue.enqueue(task()).await.unwrap();

    queue.pull(LONG_LEASE).await.unwrap().unwrap();

    assert!(queue.pull(LONG_LEASE).await.unwrap().is_none());
}

#[tokio::test]
async fn given_expired_lease_when_pulled_then_task_returns_with_next_attempt() {
    let queue = InMemoryTaskQueue::new(3);
    queue.enqueue(task()).await.unwrap();

    queue.pull(Duration::from_millis(1)).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();
    assert_eq!(leased.attempt, 2);
}

#[tokio::test]
async fn given_expired_lease_out_of_attempts_when_pulled_then_nothing_returned() {
    let queue = InMemoryTaskQueue::new(1);
    let task = task();
    let task_id = task.id;
    queue.enqueue(task).await.unwrap();

    queue.pull(Duration::from_millis(1)).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(queue.pull(LONG_LEASE).await.unwrap().is_none());
    let state = queue.get_state(task_id).await.unwrap().unwrap();
    assert_eq!(state.attempts, 1);
}

#[tokio::test]
async fn given_expired_lease_out_of_attempts_when_reaped_then_parked_failed_once() {
    let queue = InMemoryTaskQueue::new(1);
    let task = task();
    let task_id = task.id;
    let meeting_id = task.meeting_id;
    queue.enqueue(task).await.unwrap();

    queue.pull(Duration::from_millis(1)).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let reaped = queue.reap_exhausted().await.unwrap();
    assert_eq!(reaped, vec![meeting_id]);

    let state = queue.get_state(task_id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Failed);
    assert!(state.last_error.is_some());

    // Already parked; a second sweep finds nothing.
    assert!(queue.reap_exhausted().await.unwrap().is_empty());
}

#[tokio::test]
async fn given_expired_lease_with_attempts_left_when_reaped_then_left_for_pull() {
    let queue = InMemoryTaskQueue::new(3);
    queue.enqueue(task()).await.unwrap();

    queue.pull(Duration::from_millis(1)).await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(queue.reap_exhausted().await.unwrap().is_empty());
    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();
    assert_eq!(leased.attempt, 2);
}

#[tokio::test]
async fn given_retryable_failure_under_limit_when_failed_then_requeued() {
    let queue = InMemoryTaskQueue::new(3);
    queue.enqueue(task()).await.unwrap();
    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();

    let disposition = queue
        .fail(leased.task.id, "provider unavailable", true)
        .await
        .unwrap();

    assert_eq!(disposition, TaskDisposition::Requeued);
    let state = queue.get_state(leased.task.id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Queued);
    assert_eq!(state.last_error.as_deref(), Some("provider unavailable"));
}

#[tokio::test]
async fn given_retryable_failure_at_limit_when_failed_then_terminal() {
    let queue = InMemoryTaskQueue::new(1);
    queue.enqueue(task()).await.unwrap();
    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();

    let disposition = queue
        .fail(leased.task.id, "provider unavailable", true)
        .await
        .unwrap();

    assert_eq!(disposition, TaskDisposition::Terminal);
    let state = queue.get_state(leased.task.id).await.unwrap().unwrap();
    assert_eq!(state.status, QueueTaskStatus::Failed);
}

#[tokio::test]
async fn given_non_retryable_failure_when_failed_then_terminal_regardless_of_attempts() {
    let queue = InMemoryTaskQueue::new(5);
    queue.enqueue(task()).await.unwrap();
    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();

    let disposition = queue
        .fail(leased.task.id, "file missing", false)
        .await
        .unwrap();

    assert_eq!(disposition, TaskDisposition::Terminal);
}

#[tokio::test]
async fn given_completed_task_when_queried_then_no_state_remains() {
    let queue = InMemoryTaskQueue::new(3);
    queue.enqueue(task()).await.unwrap();
    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();

    queue.complete(leased.task.id).await.unwrap();

    assert!(queue.get_state(leased.task.id).await.unwrap().is_none());
    assert!(queue.pull(LONG_LEASE).await.unwrap().is_none());
}

#[tokio::test]
async fn given_failed_task_when_pulled_then_never_returned() {
    let queue = InMemoryTaskQueue::new(1);
    queue.enqueue(task()).await.unwrap();
    let leased = queue.pull(LONG_LEASE).await.unwrap().unwrap();
    queue.fail(leased.task.id, "boom", true).await.unwrap();

    assert!(queue.pull(LONG_LEASE).await.unwrap().is_none());
}
