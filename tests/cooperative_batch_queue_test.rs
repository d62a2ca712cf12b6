//! Producer/consumer scenarios for the async batch queue on a paused clock.

mod common;

use batchqueue::{AsyncBatchQueue, QueueError, Wait};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_test::{assert_err, assert_ok};

const SAMPLES: u32 = 10;

/// Producer gaps (ms) before each put
const GAPS_MS: [u64; SAMPLES as usize] = [0, 300, 650, 900, 100, 200, 750, 50, 999, 10];

async fn producer(queue: Arc<AsyncBatchQueue<u32>>) {
    for (item, gap) in (1..=SAMPLES).zip(GAPS_MS) {
        time::sleep(Duration::from_millis(gap)).await;
        assert_ok!(queue.put(item, Wait::Block).await);
    }
}

#[tokio::test(start_paused = true)]
async fn test_polling_batch_consumer() {
    common::init_test_logging();
    let queue = Arc::new(AsyncBatchQueue::new(common::test_config(700)).unwrap());

    let consumer = {
        let queue = Arc::clone(&queue);
        async move {
            let mut batches = Vec::new();
            loop {
                let items = match queue.get_batch(Wait::NoWait).await {
                    Ok(items) => items,
                    Err(QueueError::Empty) => {
                        time::sleep(Duration::from_millis(10)).await;
                        continue;
                    }
                    Err(err) => panic!("unexpected batch error: {err}"),
                };
                for _ in &items {
                    assert_ok!(queue.task_done());
                }
                let last = items.last().copied();
                batches.push(items);
                if last == Some(SAMPLES) {
                    return batches;
                }
            }
        }
    };

    let ((), batches) = tokio::join!(producer(Arc::clone(&queue)), consumer);

    assert_eq!(
        batches,
        vec![
            vec![1, 2, 3],
            vec![4, 5, 6],
            vec![7, 8],
            vec![9, 10],
        ]
    );
    queue.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_blocking_batch_consumer() {
    let queue = Arc::new(AsyncBatchQueue::new(common::test_config(700)).unwrap());

    let consumer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            let mut delivered = Vec::new();
            while delivered.last() != Some(&SAMPLES) {
                let batch = queue.get_batch(Wait::Block).await.unwrap();
                for _ in &batch {
                    queue.task_done().unwrap();
                }
                delivered.extend(batch);
            }
            delivered
        })
    };

    producer(Arc::clone(&queue)).await;
    queue.join().await;
    assert_eq!(consumer.await.unwrap(), (1..=SAMPLES).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_basic_queue_consumer() {
    let queue = Arc::new(AsyncBatchQueue::new(common::test_config(700)).unwrap());

    let consumer = {
        let queue = Arc::clone(&queue);
        async move {
            loop {
                let item = queue.get(Wait::Block).await.unwrap();
                queue.task_done().unwrap();
                if item == SAMPLES {
                    break;
                }
            }
        }
    };

    tokio::join!(producer(Arc::clone(&queue)), consumer);
    queue.join().await;
    assert!(queue.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lull_scenario_700ms() {
    let queue = AsyncBatchQueue::new(common::test_config(700)).unwrap();
    let start = Instant::now();

    queue.put(1, Wait::Block).await.unwrap();
    time::sleep(Duration::from_millis(300)).await;
    queue.put(2, Wait::Block).await.unwrap();

    assert_eq!(queue.get_batch(Wait::Block).await.unwrap(), vec![1, 2]);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1000) && elapsed < Duration::from_millis(1005));
}

#[tokio::test(start_paused = true)]
async fn test_capacity_one_scenario() {
    let queue = AsyncBatchQueue::new(common::test_config(100).with_capacity(1)).unwrap();
    assert_ok!(queue.put(1, Wait::Block).await);

    let err = assert_err!(queue.put(2, Wait::NoWait).await);
    assert!(err.is_full());
    assert!(queue.is_full());
}

#[tokio::test(start_paused = true)]
async fn test_empty_queue_batch_timeout_scenario() {
    let queue = AsyncBatchQueue::<u8>::new(common::test_config(700)).unwrap();
    let start = Instant::now();

    let result = queue.get_batch(Wait::from_secs_f64(0.1).unwrap()).await;
    assert_eq!(result, Err(QueueError::Empty));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(105));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_spans_lull_resets() {
    let queue = Arc::new(AsyncBatchQueue::new(common::test_config(200)).unwrap());
    queue.put(0, Wait::Block).await.unwrap();

    // Keep resetting the lull faster than it can expire
    let producer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            for i in 1..=10 {
                time::sleep(Duration::from_millis(100)).await;
                queue.put(i, Wait::Block).await.unwrap();
            }
        })
    };

    let start = Instant::now();
    let result = queue
        .get_batch(Wait::Timeout(Duration::from_millis(500)))
        .await;
    assert_eq!(result, Err(QueueError::Empty));
    assert!(start.elapsed() >= Duration::from_millis(500));

    producer.await.unwrap();
    assert_eq!(
        queue.get_batch(Wait::Block).await.unwrap(),
        (0..=10).collect::<Vec<_>>()
    );
}
