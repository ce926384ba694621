use metronome::{
    SchedulerConfig, StopSignal, TickScheduler, thread_factory::ThreadFactory, wait_for_duration,
};
use metronome_nullable_clock::SteadyClock;
use ntest::{assert_false, timeout};
use std::{
    collections::HashSet,
    sync::{
        Arc, Barrier,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn assert_timely(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let start = Instant::now();
    while !condition() {
        if start.elapsed() > timeout {
            panic!("condition not met within {timeout:?}");
        }
        thread::sleep(ms(1));
    }
}

/// Counts invocations until `limit` is reached
fn capped_counter(limit: usize) -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let count2 = count.clone();
    (count, move || {
        let _ = count2.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
            (c < limit).then_some(c + 1)
        });
    })
}

#[test]
fn subscribed_callback_does_not_fire_without_start() {
    let scheduler = TickScheduler::new(ms(2)).unwrap();
    let (count, callback) = capped_counter(usize::MAX);
    scheduler.subscribe(ms(4), callback).unwrap();

    wait_for_duration(ms(20));

    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_false!(scheduler.is_running());
}

#[test]
#[timeout(10000)]
fn counter_reaches_expected_value() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    let (count, callback) = capped_counter(10);
    scheduler.subscribe(ms(2), callback).unwrap();
    scheduler.start().unwrap();

    assert_timely(Duration::from_secs(5), || count.load(Ordering::SeqCst) == 10);
}

#[test]
#[timeout(10000)]
fn callbacks_subscribed_before_and_after_start() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    let (count1, callback1) = capped_counter(10);
    let (count2, callback2) = capped_counter(20);
    scheduler.subscribe(ms(2), callback1).unwrap();
    scheduler.start().unwrap();
    scheduler.subscribe(ms(3), callback2).unwrap();

    assert_timely(Duration::from_secs(5), || {
        count1.load(Ordering::SeqCst) == 10 && count2.load(Ordering::SeqCst) == 20
    });
}

#[test]
fn period_not_multiple_of_tick_does_not_fire_early() {
    let scheduler = TickScheduler::new(ms(2)).unwrap();
    let (count, callback) = capped_counter(usize::MAX);
    scheduler.subscribe(ms(17), callback).unwrap();
    scheduler.start().unwrap();

    wait_for_duration(ms(20));
    scheduler.stop();

    // the first hit is at 34ms of tick time, which needs at least 34ms of waiting
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
#[timeout(10000)]
fn unsubscribe_stops_invocations() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    let (count, callback) = capped_counter(usize::MAX);
    let handle = scheduler.subscribe(ms(2), callback).unwrap();
    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || count.load(Ordering::SeqCst) > 0);

    assert!(scheduler.unsubscribe(&handle));
    let count_after_unsubscribe = count.load(Ordering::SeqCst);
    wait_for_duration(ms(20));

    // a dispatch pass in progress may still call it once
    assert!(count.load(Ordering::SeqCst) <= count_after_unsubscribe + 1);
    assert_false!(scheduler.unsubscribe(&handle));
}

#[test]
#[timeout(10000)]
fn no_invocation_after_stop_returned() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    let stopped = Arc::new(AtomicBool::new(false));
    let called_after_stop = Arc::new(AtomicBool::new(false));
    let (stopped2, called_after_stop2) = (stopped.clone(), called_after_stop.clone());
    let (count, counter) = capped_counter(usize::MAX);
    scheduler
        .subscribe(ms(2), move || {
            counter();
            if stopped2.load(Ordering::SeqCst) {
                called_after_stop2.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();

    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || count.load(Ordering::SeqCst) > 2);
    scheduler.stop();
    stopped.store(true, Ordering::SeqCst);
    let count_at_stop = count.load(Ordering::SeqCst);

    wait_for_duration(ms(20));

    assert_false!(called_after_stop.load(Ordering::SeqCst));
    assert_eq!(count.load(Ordering::SeqCst), count_at_stop);
    assert_false!(scheduler.is_running());
}

#[test]
#[timeout(10000)]
fn start_while_running_keeps_elapsed_time() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || scheduler.elapsed() >= ms(5));

    let before = scheduler.elapsed();
    scheduler.start().unwrap();

    assert!(scheduler.elapsed() >= before);
    assert!(scheduler.is_running());
}

#[test]
#[timeout(10000)]
fn concurrent_starts_spawn_one_clock_thread() {
    let thread_factory = Arc::new(ThreadFactory::default());
    let spawn_tracker = thread_factory.track_spawns();
    let scheduler = Arc::new(
        TickScheduler::with_infrastructure(
            SchedulerConfig::with_tick(ms(1)),
            thread_factory,
            StopSignal::new(),
            Arc::new(SteadyClock::default()),
        )
        .unwrap(),
    );

    let barrier = Arc::new(Barrier::new(8));
    let starters: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = scheduler.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                scheduler.start().unwrap();
            })
        })
        .collect();
    for starter in starters {
        starter.join().unwrap();
    }

    assert_eq!(spawn_tracker.output().len(), 1);
    scheduler.stop();
}

#[test]
#[timeout(10000)]
fn concurrent_subscriptions_while_running() {
    let scheduler = Arc::new(TickScheduler::new(ms(1)).unwrap());
    scheduler.start().unwrap();

    let subscribers: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = scheduler.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|i| scheduler.subscribe(ms(1 + i % 5), || {}).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let handles: HashSet<_> = subscribers
        .into_iter()
        .flat_map(|s| s.join().unwrap())
        .collect();

    assert_eq!(handles.len(), 400);
    assert_eq!(scheduler.subscription_count(), 400);
    scheduler.stop();
}

#[test]
#[timeout(10000)]
fn stop_waits_for_callback_in_progress() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    let entered = Arc::new(AtomicBool::new(false));
    let finished = Arc::new(AtomicBool::new(false));
    let (entered2, finished2) = (entered.clone(), finished.clone());
    scheduler
        .subscribe(ms(1), move || {
            if !entered2.swap(true, Ordering::SeqCst) {
                thread::sleep(ms(50));
                finished2.store(true, Ordering::SeqCst);
            }
        })
        .unwrap();

    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || entered.load(Ordering::SeqCst));
    scheduler.stop();

    assert!(finished.load(Ordering::SeqCst));
}

#[test]
#[timeout(10000)]
fn stop_does_not_wait_for_next_tick() {
    let scheduler = TickScheduler::new(Duration::from_secs(60)).unwrap();
    scheduler.start().unwrap();
    wait_for_duration(ms(5));

    let start = Instant::now();
    scheduler.stop();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(scheduler.elapsed(), Duration::ZERO);
}

#[test]
fn stop_while_idle_is_noop() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    scheduler.stop();
    scheduler.stop();
    assert_false!(scheduler.is_running());
}

#[test]
#[timeout(10000)]
fn restart_after_stop() {
    let scheduler = TickScheduler::new(ms(1)).unwrap();
    let (count, callback) = capped_counter(usize::MAX);
    scheduler.subscribe(ms(1), callback).unwrap();

    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || count.load(Ordering::SeqCst) > 0);
    scheduler.stop();
    let count_after_first_run = count.load(Ordering::SeqCst);

    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || {
        count.load(Ordering::SeqCst) > count_after_first_run
    });
    scheduler.stop();
}

#[test]
#[timeout(10000)]
fn callback_can_stop_the_scheduler() {
    let scheduler = Arc::new(TickScheduler::new(ms(1)).unwrap());
    let (count, counter) = capped_counter(usize::MAX);
    let weak = Arc::downgrade(&scheduler);
    scheduler
        .subscribe(ms(3), move || {
            counter();
            if let Some(scheduler) = weak.upgrade() {
                scheduler.stop();
            }
        })
        .unwrap();

    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || !scheduler.is_running());

    assert_eq!(count.load(Ordering::SeqCst), 1);
    scheduler.stop();
}

#[test]
#[timeout(10000)]
fn start_while_callback_stop_is_pending_restarts_the_clock() {
    let scheduler = Arc::new(TickScheduler::new(ms(1)).unwrap());
    let stop_requested = Arc::new(AtomicBool::new(false));
    let stopping_callback_done = Arc::new(AtomicBool::new(false));
    let (count, counter) = capped_counter(usize::MAX);
    let (stop_requested2, stopping_callback_done2) =
        (stop_requested.clone(), stopping_callback_done.clone());
    let weak = Arc::downgrade(&scheduler);
    scheduler
        .subscribe(ms(1), move || {
            counter();
            if stop_requested2.load(Ordering::SeqCst) {
                return;
            }
            if let Some(scheduler) = weak.upgrade() {
                scheduler.stop();
            }
            stop_requested2.store(true, Ordering::SeqCst);
            thread::sleep(ms(50));
            stopping_callback_done2.store(true, Ordering::SeqCst);
        })
        .unwrap();

    scheduler.start().unwrap();
    assert_timely(Duration::from_secs(5), || stop_requested.load(Ordering::SeqCst));
    scheduler.start().unwrap();

    assert!(stopping_callback_done.load(Ordering::SeqCst));
    assert!(scheduler.is_running());
    assert_timely(Duration::from_secs(5), || count.load(Ordering::SeqCst) > 1);
    scheduler.stop();
}

#[test]
#[timeout(10000)]
fn dropping_the_scheduler_stops_the_clock() {
    let (count, callback) = capped_counter(usize::MAX);
    {
        let scheduler = TickScheduler::new(ms(1)).unwrap();
        scheduler.subscribe(ms(1), callback).unwrap();
        scheduler.start().unwrap();
        assert_timely(Duration::from_secs(5), || count.load(Ordering::SeqCst) > 0);
    }
    let count_after_drop = count.load(Ordering::SeqCst);

    wait_for_duration(ms(20));

    assert_eq!(count.load(Ordering::SeqCst), count_after_drop);
}
