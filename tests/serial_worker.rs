use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{Notify, broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use serialvisor::{
    Config, ENQUEUE_STATE_MESSAGE, Event, EventKind, HandlerError, HandlerFn, HandlerRef,
    START_STATE_MESSAGE, SerialWorker, WorkerState,
};

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn recording_worker() -> (SerialWorker<u32>, Arc<Mutex<Vec<u32>>>) {
    (SerialWorker::new(), Arc::new(Mutex::new(Vec::new())))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_are_handled_once_in_enqueue_order() {
    let (worker, seen) = recording_worker();
    let sink = seen.clone();
    worker
        .start(HandlerFn::arc(move |n: u32, _ctx: CancellationToken| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(n);
                Ok(())
            }
        }))
        .await
        .unwrap();

    const N: u32 = 500;
    for n in 0..N {
        worker.enqueue(n).unwrap();
        if n % 50 == 0 {
            tokio::task::yield_now().await;
        }
    }

    wait_until("all requests handled", || seen.lock().unwrap().len() == N as usize).await;
    assert_eq!(*seen.lock().unwrap(), (0..N).collect::<Vec<_>>());
    wait_until("worker idle", || worker.state() == WorkerState::Ready).await;
    assert_eq!(worker.pending(), 0);

    worker.dispose().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_doubling_handler_runs_then_returns_to_ready() {
    let worker = SerialWorker::<u64>::new();
    let mut rx = worker.subscribe();
    let gate = Arc::new(Notify::new());
    let (tx, mut results) = mpsc::unbounded_channel();

    let g = gate.clone();
    worker
        .start(HandlerFn::arc(move |n: u64, _ctx: CancellationToken| {
            let g = g.clone();
            let tx = tx.clone();
            async move {
                g.notified().await;
                let _ = tx.send(n * 2);
                Ok(())
            }
        }))
        .await
        .unwrap();
    assert_eq!(worker.state(), WorkerState::Ready);

    worker.enqueue(1).unwrap();
    assert_eq!(worker.state(), WorkerState::Running);

    gate.notify_one();
    assert_eq!(results.recv().await, Some(2));
    wait_until("back to ready", || worker.state() == WorkerState::Ready).await;

    let transitions: Vec<(WorkerState, WorkerState)> = drain_events(&mut rx)
        .into_iter()
        .filter(|e| e.kind == EventKind::StateChanged)
        .filter_map(|e| Some((e.from?, e.to?)))
        .collect();
    assert!(transitions.contains(&(WorkerState::Ready, WorkerState::Running)));
    assert!(transitions.contains(&(WorkerState::Running, WorkerState::Ready)));

    assert!(worker.try_stop().await.unwrap());
    assert_eq!(worker.state(), WorkerState::Stopped);
    worker.dispose().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispose_tears_down_once() {
    let worker = Arc::new(SerialWorker::<u32>::new());
    let mut rx = worker.subscribe();
    worker
        .start(HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) }))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let w = worker.clone();
        handles.push(tokio::spawn(async move { w.dispose().await }));
    }
    for h in handles {
        h.await.unwrap();
    }

    assert_eq!(worker.state(), WorkerState::Disposed);
    let disposing = drain_events(&mut rx)
        .into_iter()
        .filter(|e| e.kind == EventKind::StateChanged && e.to == Some(WorkerState::Disposing))
        .count();
    assert_eq!(disposing, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_try_stop_succeeds_once() {
    let worker = Arc::new(SerialWorker::<u32>::new());
    worker
        .start(HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) }))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let w = worker.clone();
        handles.push(tokio::spawn(async move { w.try_stop().await }));
    }
    let mut stopped = 0;
    for h in handles {
        if h.await.unwrap().unwrap() {
            stopped += 1;
        }
    }

    assert_eq!(stopped, 1);
    assert_eq!(worker.state(), WorkerState::Stopped);
    worker.dispose().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_try_reset_succeeds_once() {
    let worker = Arc::new(SerialWorker::<u32>::new());
    worker
        .start(HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) }))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let w = worker.clone();
        handles.push(tokio::spawn(async move { w.try_reset().await }));
    }
    let mut resets = 0;
    for h in handles {
        if h.await.unwrap().unwrap() {
            resets += 1;
        }
    }

    assert_eq!(resets, 1);
    assert_eq!(worker.state(), WorkerState::Initialized);
    worker.dispose().await;
}

#[tokio::test]
async fn test_enqueue_outside_ready_or_running_is_rejected() {
    let worker = SerialWorker::<u32>::new();

    let err = worker.enqueue(1).unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(err.to_string(), ENQUEUE_STATE_MESSAGE);
    assert_eq!(err.field(), Some("enqueue"));

    worker
        .start(HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) }))
        .await
        .unwrap();
    assert!(worker.try_stop().await.unwrap());
    let err = worker.enqueue(2).unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(err.to_string(), ENQUEUE_STATE_MESSAGE);

    worker.dispose().await;
    assert!(worker.enqueue(3).unwrap_err().is_disposed());
}

#[tokio::test]
async fn test_operations_after_dispose_fail_with_disposed() {
    let worker = SerialWorker::<u32>::new();
    worker.dispose().await;
    worker.dispose().await;

    assert!(worker.try_stop().await.unwrap_err().is_disposed());
    assert!(worker.try_reset().await.unwrap_err().is_disposed());
    let err = worker
        .start(HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) }))
        .await
        .unwrap_err();
    assert!(err.is_disposed());
    assert_eq!(err.field(), Some("start"));
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let worker = SerialWorker::<u32>::new();
    let handler: HandlerRef<u32> =
        HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) });
    worker.start(handler.clone()).await.unwrap();

    let err = worker.start(handler).await.unwrap_err();
    assert!(err.is_invalid_state());
    assert_eq!(err.to_string(), START_STATE_MESSAGE);
    assert_eq!(worker.state(), WorkerState::Ready);

    worker.dispose().await;
}

#[tokio::test]
async fn test_reset_on_fresh_worker_is_noop() {
    let worker = SerialWorker::<u32>::new();
    let generation = worker.generation();

    assert!(!worker.try_reset().await.unwrap());
    assert_eq!(worker.state(), WorkerState::Initialized);
    assert_eq!(worker.generation(), generation);
}

#[tokio::test]
async fn test_stop_then_stop_again_returns_false() {
    let worker = SerialWorker::<u32>::new();
    worker
        .start(HandlerFn::arc(|_: u32, _ctx: CancellationToken| async { Ok(()) }))
        .await
        .unwrap();

    assert!(worker.try_stop().await.unwrap());
    assert!(!worker.try_stop().await.unwrap());
    assert_eq!(worker.state(), WorkerState::Stopped);

    assert!(worker.try_reset().await.unwrap());
    assert_eq!(worker.state(), WorkerState::Initialized);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_generation_works_like_the_first() {
    let worker = SerialWorker::<u64>::new();
    let first_gen = worker.generation();
    let total = Arc::new(AtomicU64::new(0));

    let sink = total.clone();
    worker
        .start(HandlerFn::arc(move |n: u64, _ctx: CancellationToken| {
            let sink = sink.clone();
            async move {
                sink.fetch_add(n, Ordering::SeqCst);
                Ok(())
            }
        }))
        .await
        .unwrap();
    assert!(worker.try_reset().await.unwrap());
    assert_ne!(worker.generation(), first_gen);

    let (tx, mut rx) = mpsc::unbounded_channel();
    worker
        .start(HandlerFn::arc(move |n: u64, _ctx: CancellationToken| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(n * 10);
                Ok(())
            }
        }))
        .await
        .unwrap();
    worker.enqueue(4).unwrap();

    assert_eq!(rx.recv().await, Some(40));
    assert_eq!(total.load(Ordering::SeqCst), 0);
    worker.dispose().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handler_failures_do_not_stop_the_worker() {
    let worker = SerialWorker::<u32>::new();
    let mut rx = worker.subscribe();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    worker
        .start(HandlerFn::arc(move |n: u32, _ctx: CancellationToken| {
            let sink = sink.clone();
            async move {
                match n {
                    1 => Err(HandlerError::fail("bad request")),
                    2 => panic!("handler exploded"),
                    _ => {
                        sink.lock().unwrap().push(n);
                        Ok(())
                    }
                }
            }
        }))
        .await
        .unwrap();

    for n in 0..4 {
        worker.enqueue(n).unwrap();
    }
    wait_until("healthy requests handled", || seen.lock().unwrap().len() == 2).await;
    assert_eq!(*seen.lock().unwrap(), vec![0, 3]);

    let failures: Vec<Event> = drain_events(&mut rx)
        .into_iter()
        .filter(|e| e.kind == EventKind::HandlerFailed)
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures[0].error.as_deref().unwrap().contains("bad request"));
    assert!(failures[1].error.as_deref().unwrap().contains("handler exploded"));

    assert!(worker.try_stop().await.unwrap());
    worker.dispose().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_discards_pending_requests() {
    let worker = SerialWorker::<u32>::new();
    let mut rx = worker.subscribe();
    let gate = Arc::new(Notify::new());

    let g = gate.clone();
    worker
        .start(HandlerFn::arc(move |_: u32, ctx: CancellationToken| {
            let g = g.clone();
            async move {
                tokio::select! {
                    _ = g.notified() => Ok(()),
                    _ = ctx.cancelled() => Err(HandlerError::Canceled),
                }
            }
        }))
        .await
        .unwrap();

    for n in 0..5 {
        worker.enqueue(n).unwrap();
    }
    wait_until("first request picked up", || worker.pending() == 4).await;

    assert!(worker.try_stop().await.unwrap());
    assert_eq!(worker.pending(), 0);

    let events = drain_events(&mut rx);
    let discarded = events
        .iter()
        .find(|e| e.kind == EventKind::RequestsDiscarded)
        .and_then(|e| e.count);
    assert_eq!(discarded, Some(4));
    assert!(events.iter().any(|e| e.kind == EventKind::WorkerCancelled));
    assert!(!events.iter().any(|e| e.kind == EventKind::JoinTimedOut));

    worker.dispose().await;
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drop_aborts_undisposed_worker() {
    let dropped = Arc::new(AtomicBool::new(false));
    let worker = SerialWorker::<u32>::builder(Config::default()).build();

    let flag = dropped.clone();
    worker
        .start(HandlerFn::arc(move |_: u32, _ctx: CancellationToken| {
            let guard = SetOnDrop(flag.clone());
            async move {
                let _guard = guard;
                std::future::pending::<()>().await;
                Ok(())
            }
        }))
        .await
        .unwrap();
    worker.enqueue(1).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    drop(worker);
    wait_until("handler future dropped", || dropped.load(Ordering::SeqCst)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_drop_finishes_abandoned_dispose() {
    let dropped = Arc::new(AtomicBool::new(false));
    let cfg = Config::default().with_join_timeout(Duration::from_secs(30));
    let worker = SerialWorker::<u32>::builder(cfg).build();
    let mut rx = worker.subscribe();

    let flag = dropped.clone();
    worker
        .start(HandlerFn::arc(move |_: u32, _ctx: CancellationToken| {
            let guard = SetOnDrop(flag.clone());
            async move {
                let _guard = guard;
                std::future::pending::<()>().await;
                Ok(())
            }
        }))
        .await
        .unwrap();
    worker.enqueue(1).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let abandoned = tokio::time::timeout(Duration::from_millis(50), worker.dispose()).await;
    assert!(abandoned.is_err());
    assert_eq!(worker.state(), WorkerState::Disposing);

    drop(worker);
    wait_until("handler future dropped", || dropped.load(Ordering::SeqCst)).await;

    let reached_disposed = drain_events(&mut rx)
        .iter()
        .any(|e| e.kind == EventKind::StateChanged && e.to == Some(WorkerState::Disposed));
    assert!(reached_disposed);
}
