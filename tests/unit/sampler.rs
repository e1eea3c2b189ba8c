use super::*;
use crate::test_support::FakeViewport;
use crate::viewport::{RasterFormat, Viewport};
use std::sync::Arc;

fn start_on(sampler: &mut FrameSampler, vp: &Arc<FakeViewport>, period_ms: u64) {
    let vp = Arc::clone(vp);
    let started = sampler
        .start(Duration::from_millis(period_ms), move || {
            let vp = Arc::clone(&vp);
            async move { vp.snapshot().await }
        })
        .unwrap();
    assert!(started);
}

fn payloads(report: &SamplerReport) -> Vec<String> {
    report
        .frames
        .frames()
        .iter()
        .map(|f| String::from_utf8(f.raster.bytes.clone()).unwrap())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn failed_tick_is_dropped_and_sampling_continues() {
    let vp = Arc::new(FakeViewport {
        fail_snapshot_call: Some(5),
        ..FakeViewport::default()
    });
    let mut sampler = FrameSampler::new();
    start_on(&mut sampler, &vp, 100);

    tokio::time::sleep(Duration::from_millis(1950)).await;
    let report = sampler.stop().await;

    assert_eq!(report.ticks, 20);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.frames.len(), 19);

    let indices: Vec<u64> = report.frames.frames().iter().map(|f| f.index.0).collect();
    assert_eq!(indices, (0..19).collect::<Vec<u64>>());

    let names = payloads(&report);
    assert_eq!(names[3], "frame-4");
    assert_eq!(names[4], "frame-6");
    assert_eq!(names[18], "frame-20");
}

#[tokio::test(start_paused = true)]
async fn ticks_due_during_a_slow_snapshot_are_skipped() {
    let vp = Arc::new(FakeViewport {
        snapshot_delay: Duration::from_millis(250),
        ..FakeViewport::default()
    });
    let mut sampler = FrameSampler::new();
    start_on(&mut sampler, &vp, 100);

    tokio::time::sleep(Duration::from_millis(650)).await;
    let report = sampler.stop().await;

    // Snapshots start at 0, 300 and 600 ms; the one started at 600 finishes after stop.
    assert_eq!(report.ticks, 3);
    assert_eq!(report.skipped, 4);
    assert_eq!(report.frames.len(), 3);
    assert_eq!(payloads(&report), vec!["frame-1", "frame-2", "frame-3"]);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_sampled_after_stop_returns() {
    let vp = Arc::new(FakeViewport::default());
    let mut sampler = FrameSampler::new();
    start_on(&mut sampler, &vp, 100);

    tokio::time::sleep(Duration::from_millis(1050)).await;
    let report = sampler.stop().await;
    let calls = vp.snapshot_calls();
    assert_eq!(report.frames.len(), calls);
    assert!(!sampler.is_running());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(vp.snapshot_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn frame_count_tracks_elapsed_time() {
    let vp = Arc::new(FakeViewport::default());
    let mut sampler = FrameSampler::new();
    start_on(&mut sampler, &vp, 100);

    tokio::time::sleep(Duration::from_millis(3050)).await;
    let report = sampler.stop().await;
    // floor(3.05 s * 10 Hz) plus the immediate first tick.
    assert_eq!(report.frames.len(), 31);
}

#[tokio::test(start_paused = true)]
async fn double_start_and_idle_stop_are_no_ops() {
    let vp = Arc::new(FakeViewport::default());
    let mut sampler = FrameSampler::new();
    assert_eq!(sampler.stop().await, SamplerReport::default());

    start_on(&mut sampler, &vp, 100);
    let again = sampler
        .start(Duration::from_millis(100), || async {
            Raster::new(RasterFormat::Png, vec![1])
        })
        .unwrap();
    assert!(!again);
    sampler.stop().await;
}

#[tokio::test]
async fn zero_period_is_rejected() {
    let mut sampler = FrameSampler::new();
    let res = sampler.start(Duration::ZERO, || async {
        Raster::new(RasterFormat::Png, vec![1])
    });
    assert!(matches!(res, Err(ReelError::Validation(_))));
}

#[test]
fn buffer_assigns_contiguous_indices() {
    let mut buf = FrameBuffer::new();
    assert!(buf.is_empty());
    let jpeg = |bytes: Vec<u8>| Raster::new(RasterFormat::Jpeg, bytes).unwrap();
    assert_eq!(buf.push(jpeg(vec![1, 2])), FrameIndex(0));
    assert_eq!(buf.push(jpeg(vec![3])), FrameIndex(1));
    assert_eq!(buf.push(jpeg(vec![4])), FrameIndex(2));
    assert_eq!(buf.len(), 3);
    assert_eq!(buf.payload_bytes(), 4);
}
