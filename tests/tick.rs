use fairsim::{SchedEvent, Scheduler};

mod common;

/// A single task on a single CPU runs every tick with no preemptions
/// or migrations.
#[test]
fn test_single_task_single_cpu() {
    common::setup_test();
    let mut sched = Scheduler::new(1, 1);

    let r0 = sched.tick(0, &[common::create("A")]);
    assert_eq!(r0.schedule, vec!["A"]);
    assert_eq!(r0.meta.preemptions, 0);
    assert_eq!(r0.meta.migrations, 0);

    for vtime in 1..3 {
        let r = sched.tick(vtime, &[]);
        assert_eq!(r.schedule, vec!["A"]);
        assert_eq!(r.meta.preemptions, 0);
        assert_eq!(r.meta.migrations, 0);
    }
}

/// Two equal-weight tasks on one CPU alternate, first pick decided by
/// id tie-break, and every handover counts as a preemption.
#[test]
fn test_two_equal_tasks_alternate() {
    common::setup_test();
    let mut sched = Scheduler::new(1, 1);

    let r0 = sched.tick(0, &[common::create("A"), common::create("B")]);
    assert_eq!(r0.schedule, vec!["A"]);
    assert_eq!(r0.meta.preemptions, 0);

    let expected = ["B", "A", "B", "A", "B"];
    for (i, want) in expected.iter().enumerate() {
        let r = sched.tick(1 + i as i64, &[]);
        assert_eq!(r.schedule, vec![want.to_string()], "tick {}", i + 1);
        assert_eq!(r.meta.preemptions, 1, "tick {}", i + 1);
        assert_eq!(r.meta.migrations, 0, "tick {}", i + 1);
    }
}

/// CPUs with no feasible task report "idle".
#[test]
fn test_extra_cpus_stay_idle() {
    common::setup_test();
    let mut sched = Scheduler::new(3, 1);

    let r = sched.tick(0, &[common::create("A")]);
    assert_eq!(r.schedule, vec!["A", "idle", "idle"]);
    // No occupant changed away from a task, so nothing was preempted.
    assert_eq!(r.meta.preemptions, 0);
}

/// A CPU going from a task to idle counts as a preemption of the old
/// occupant.
#[test]
fn test_going_idle_counts_as_preemption() {
    common::setup_test();
    let mut sched = Scheduler::new(1, 1);

    sched.tick(0, &[common::create("A")]);
    let r = sched.tick(
        1,
        &[SchedEvent::TaskExit {
            task_id: "A".to_string(),
        }],
    );
    assert_eq!(r.schedule, vec!["idle"]);
    assert_eq!(r.meta.preemptions, 1);
}

/// The batch label is echoed untouched, negative values included.
#[test]
fn test_vtime_echoed() {
    common::setup_test();
    let mut sched = Scheduler::new(1, 1);
    assert_eq!(sched.tick(-7, &[]).vtime, -7);
    assert_eq!(sched.tick(i64::MAX, &[]).vtime, i64::MAX);
}

/// At most min(cpus, runnable tasks) slots are filled, and a task is
/// never assigned to two CPUs in the same tick.
#[test]
fn test_no_double_assignment() {
    common::setup_test();
    let mut sched = Scheduler::new(4, 1);

    let r = sched.tick(0, &[common::create("A"), common::create("B")]);
    let busy: Vec<&String> = r.schedule.iter().filter(|s| s.as_str() != "idle").collect();
    assert_eq!(busy.len(), 2);
    assert_ne!(busy[0], busy[1]);
}
