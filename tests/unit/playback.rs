use super::*;
use crate::test_support::FakeViewport;
use std::time::Duration;
use tokio::sync::mpsc;

fn items(durations_ms: &[u64]) -> Vec<StoryboardItem> {
    durations_ms
        .iter()
        .enumerate()
        .map(|(i, ms)| StoryboardItem::new(i, Duration::from_millis(*ms)).unwrap())
        .collect()
}

fn recorder() -> (
    impl FnMut(usize) + Send + 'static,
    mpsc::UnboundedReceiver<(usize, Instant)>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (move |i| drop(tx.send((i, Instant::now()))), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<(usize, Instant)>) -> Vec<(usize, Instant)> {
    let mut out = Vec::new();
    while let Ok(v) = rx.try_recv() {
        out.push(v);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn advances_follow_item_durations() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp.clone());
    let (on_advance, mut rx) = recorder();

    let t0 = Instant::now();
    let done = sched.start(items(&[1000, 2000]), on_advance).unwrap();
    assert!(done.wait().await);
    assert_eq!(t0.elapsed(), Duration::from_millis(3000));

    let advances = drain(&mut rx);
    let seen: Vec<(usize, Duration)> = advances.iter().map(|(i, t)| (*i, *t - t0)).collect();
    assert_eq!(
        seen,
        vec![(0, Duration::ZERO), (1, Duration::from_millis(1000))]
    );
    assert_eq!(vp.scrolls(), vec![ScrollHint::Item(0), ScrollHint::Item(1)]);

    let state = sched.state();
    assert!(!state.running);
    assert_eq!(state.cursor, Some(1));
}

#[tokio::test(start_paused = true)]
async fn every_item_is_announced_in_order() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp);
    let (on_advance, mut rx) = recorder();

    let done = sched.start(items(&[300, 10, 700, 50, 1]), on_advance).unwrap();
    assert!(done.wait().await);

    let indices: Vec<usize> = drain(&mut rx).into_iter().map(|(i, _)| i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn empty_sequence_completes_without_advances() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp.clone());
    let (on_advance, mut rx) = recorder();

    let t0 = Instant::now();
    let done = sched.start(Vec::new(), on_advance).unwrap();
    assert!(done.wait().await);
    assert_eq!(t0.elapsed(), Duration::ZERO);
    assert!(drain(&mut rx).is_empty());
    assert!(vp.scrolls().is_empty());
    assert_eq!(sched.state(), PlaybackState::default());
}

#[tokio::test(start_paused = true)]
async fn start_while_running_is_ignored() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp);
    let (first, _rx1) = recorder();
    let (second, mut rx2) = recorder();

    let _done = sched.start(items(&[1000, 1000]), first).unwrap();
    assert!(sched.start(items(&[5]), second).is_none());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(drain(&mut rx2).is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_pending_advances() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp.clone());
    let (on_advance, mut rx) = recorder();

    let done = sched.start(items(&[1000, 1000, 1000]), on_advance).unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    sched.stop().await;

    assert_eq!(sched.state(), PlaybackState::default());
    assert!(!done.wait().await);
    assert_eq!(vp.scrolls().last(), Some(&ScrollHint::Top));

    tokio::time::sleep(Duration::from_millis(5000)).await;
    let indices: Vec<usize> = drain(&mut rx).into_iter().map(|(i, _)| i).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn scroll_failures_do_not_stop_playback() {
    let vp = Arc::new(FakeViewport {
        fail_scrolls: true,
        ..FakeViewport::default()
    });
    let mut sched = PlaybackScheduler::new(vp.clone());
    let (on_advance, mut rx) = recorder();

    let done = sched.start(items(&[100, 100, 100]), on_advance).unwrap();
    assert!(done.wait().await);
    assert_eq!(drain(&mut rx).len(), 3);
    assert_eq!(vp.scrolls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_at_rest_is_a_no_op() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp.clone());
    sched.stop().await;
    assert!(vp.scrolls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_after_completion_returns_viewport_to_rest() {
    let vp = Arc::new(FakeViewport::default());
    let mut sched = PlaybackScheduler::new(vp.clone());
    let done = sched.start(items(&[100]), |_| {}).unwrap();
    assert!(done.wait().await);

    sched.stop().await;
    assert_eq!(sched.state().cursor, None);
    assert_eq!(vp.scrolls(), vec![ScrollHint::Item(0), ScrollHint::Top]);

    // A fresh run is allowed once stopped.
    assert!(sched.start(items(&[100]), |_| {}).is_some());
}
