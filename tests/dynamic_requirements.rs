use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use taskdag::{
    DynamicRequirements, MemoryStore, ParamKind, ParamSpec, RunStatus, Structure, Task, TaskArgs,
    TaskCore, TaskDef, TaskRef, TargetRef,
};

type TestResult = Result<(), Box<dyn Error>>;

struct Chunk {
    core: TaskCore,
    store: MemoryStore,
}

impl Chunk {
    fn build(n: i64, store: &MemoryStore) -> Result<TaskRef, Box<dyn Error>> {
        let def = TaskDef::builder("Chunk")
            .param(ParamSpec::new("n", ParamKind::Int))
            .build();
        Ok(Arc::new(Chunk {
            core: def.build(TaskArgs::new().pos(n))?,
            store: store.clone(),
        }))
    }

    fn uri(&self) -> String {
        format!("chunks/{}", self.core.id())
    }
}

impl Task for Chunk {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn output(&self) -> taskdag::Outputs {
        let target: TargetRef = Arc::new(self.store.target(self.uri()));
        Structure::leaf(target)
    }
}

fn chunks(count: i64, store: &MemoryStore) -> Result<Vec<TaskRef>, Box<dyn Error>> {
    (0..count).map(|n| Chunk::build(n, store)).collect()
}

fn mark_done(task: &TaskRef, store: &MemoryStore) {
    for target in task.output().flatten() {
        store.put(target.uri());
    }
}

#[test]
fn default_check_requires_every_task() -> TestResult {
    let store = MemoryStore::new();
    let tasks = chunks(3, &store)?;
    let dynamic = DynamicRequirements::new(tasks.clone());

    assert!(!dynamic.complete());
    mark_done(&tasks[0], &store);
    mark_done(&tasks[1], &store);
    assert!(!dynamic.complete());
    mark_done(&tasks[2], &store);
    assert!(dynamic.complete());
    Ok(())
}

#[test]
fn custom_predicate_fully_replaces_the_default() -> TestResult {
    let store = MemoryStore::new();
    let tasks = chunks(3, &store)?;

    // None of the tasks is complete, yet the batch reports complete: the
    // custom predicate is the only authority.
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let dynamic = DynamicRequirements::with_custom_complete(tasks, move |_complete_fn| {
        counted.fetch_add(1, Ordering::SeqCst);
        true
    });

    assert!(dynamic.complete());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn custom_predicate_receives_the_per_task_check() -> TestResult {
    let store = MemoryStore::new();
    let tasks = chunks(2, &store)?;
    mark_done(&tasks[0], &store);

    let probe = tasks[0].clone();
    let dynamic = DynamicRequirements::with_custom_complete(tasks, move |complete_fn| {
        complete_fn(probe.as_ref())
    });

    // Delegates to the first task only; the incomplete second task is never
    // consulted.
    assert!(dynamic.complete());
    Ok(())
}

#[test]
fn flat_requirements_and_paths_are_memoized() -> TestResult {
    let store = MemoryStore::new();
    let tasks = chunks(2, &store)?;
    let dynamic = DynamicRequirements::new(tasks);

    let first = dynamic.flat_requirements();
    let second = dynamic.flat_requirements();
    assert_eq!(first.len(), 2);
    assert!(std::ptr::eq(first.as_ptr(), second.as_ptr()));

    let paths: Vec<String> = dynamic.paths().flatten().iter().map(|t| t.uri()).collect();
    assert_eq!(paths.len(), 2);
    assert!(paths.iter().all(|uri| uri.starts_with("chunks/")));
    Ok(())
}

#[test]
fn run_status_carries_the_discovered_batch() -> TestResult {
    struct TwoPhase {
        core: TaskCore,
        store: MemoryStore,
    }

    impl Task for TwoPhase {
        fn core(&self) -> &TaskCore {
            &self.core
        }

        fn run(&self) -> anyhow::Result<RunStatus> {
            let discovered = Chunk::build(0, &self.store).map_err(|e| anyhow::anyhow!("{e}"))?;
            if discovered.complete() {
                return Ok(RunStatus::Done);
            }
            Ok(RunStatus::AwaitingDynamic(DynamicRequirements::new(vec![
                discovered,
            ])))
        }
    }

    let store = MemoryStore::new();
    let def = TaskDef::builder("TwoPhase").build();
    let task = TwoPhase {
        core: def.build(TaskArgs::new())?,
        store: store.clone(),
    };

    // First step yields the discovered batch; the driver satisfies it and
    // re-runs, after which the step finishes.
    match task.run()? {
        RunStatus::AwaitingDynamic(dynamic) => {
            for req in dynamic.flat_requirements() {
                mark_done(req, &store);
            }
        }
        RunStatus::Done => panic!("expected a dynamic batch on the first step"),
    }
    assert!(matches!(task.run()?, RunStatus::Done));
    Ok(())
}
