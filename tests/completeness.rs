use std::error::Error;
use std::sync::Arc;

use taskdag::task::{requires_complete, WrapperTask};
use taskdag::{
    externalize, flatten_output, MemoryStore, ParamKind, ParamSpec, Structure, Task, TaskArgs,
    TaskCore, TaskDef, TaskRef, TargetRef,
};

type TestResult = Result<(), Box<dyn Error>>;

struct Produce {
    core: TaskCore,
    store: MemoryStore,
    deps: Vec<TaskRef>,
}

impl Produce {
    fn build(name: &str, deps: Vec<TaskRef>, store: &MemoryStore) -> Result<TaskRef, Box<dyn Error>> {
        let def = TaskDef::builder("Produce")
            .param(ParamSpec::new("name", ParamKind::Str))
            .build();
        Ok(Arc::new(Produce {
            core: def.build(TaskArgs::new().pos(name))?,
            store: store.clone(),
            deps,
        }))
    }

    fn uri(&self) -> String {
        format!("out/{}.csv", self.core.id())
    }
}

impl Task for Produce {
    fn core(&self) -> &TaskCore {
        &self.core
    }

    fn requires(&self) -> taskdag::Requires {
        Structure::list(self.deps.clone())
    }

    fn output(&self) -> taskdag::Outputs {
        let target: TargetRef = Arc::new(self.store.target(self.uri()));
        Structure::leaf(target)
    }
}

struct NoOutput {
    core: TaskCore,
}

impl Task for NoOutput {
    fn core(&self) -> &TaskCore {
        &self.core
    }
}

fn no_output_task() -> Result<NoOutput, Box<dyn Error>> {
    let def = TaskDef::builder("NoOutput").build();
    Ok(NoOutput {
        core: def.build(TaskArgs::new())?,
    })
}

fn produce_uris(task: &TaskRef) -> Vec<String> {
    task.output().flatten().iter().map(|t| t.uri()).collect()
}

#[test]
fn complete_follows_declared_outputs() -> TestResult {
    let store = MemoryStore::new();
    let task = Produce::build("raw", vec![], &store)?;

    assert!(!task.complete());
    for uri in produce_uris(&task) {
        store.put(uri);
    }
    assert!(task.complete());
    Ok(())
}

#[test]
fn task_without_outputs_reports_incomplete() -> TestResult {
    let task = no_output_task()?;
    assert!(!task.complete());
    Ok(())
}

#[test]
fn wrapper_task_is_complete_when_children_are() -> TestResult {
    let store = MemoryStore::new();
    let a = Produce::build("a", vec![], &store)?;
    let b = Produce::build("b", vec![], &store)?;

    let def = TaskDef::builder("Nightly").build();
    let wrapper = WrapperTask::new(def.build(TaskArgs::new())?, vec![a.clone(), b.clone()]);

    assert!(!wrapper.complete());
    for uri in produce_uris(&a) {
        store.put(uri);
    }
    assert!(!wrapper.complete());
    for uri in produce_uris(&b) {
        store.put(uri);
    }
    assert!(wrapper.complete());
    Ok(())
}

#[test]
fn requires_complete_covers_nested_structures() -> TestResult {
    let store = MemoryStore::new();
    let a = Produce::build("a", vec![], &store)?;
    let b = Produce::build("b", vec![a.clone()], &store)?;

    assert!(!requires_complete(b.as_ref()));
    for uri in produce_uris(&a) {
        store.put(uri);
    }
    assert!(requires_complete(b.as_ref()));
    Ok(())
}

#[test]
fn externalized_task_keeps_identity_and_completeness() -> TestResult {
    let store = MemoryStore::new();
    let inner = Produce::build("raw", vec![], &store)?;
    let inner_id = inner.task_id().to_string();
    let inner_uris = produce_uris(&inner);

    let external = externalize(NoOp(inner.clone()));
    assert!(external.is_external());
    assert_eq!(external.core().id(), inner_id);
    assert!(!external.complete());
    for uri in inner_uris {
        store.put(uri);
    }
    assert!(external.complete());
    Ok(())
}

// Delegating shim so `externalize` can take ownership of a shared task.
struct NoOp(TaskRef);

impl Task for NoOp {
    fn core(&self) -> &TaskCore {
        self.0.core()
    }

    fn output(&self) -> taskdag::Outputs {
        self.0.output()
    }
}

#[test]
fn input_mirrors_the_requires_structure() -> TestResult {
    let store = MemoryStore::new();
    let a = Produce::build("a", vec![], &store)?;
    let b = Produce::build("b", vec![], &store)?;
    let top = Produce::build("top", vec![a.clone(), b.clone()], &store)?;

    let input = top.input();
    let uris: Vec<String> = input.flatten().iter().map(|t| t.uri()).collect();
    assert_eq!(uris, [produce_uris(&a), produce_uris(&b)].concat());

    // Shape is preserved: one list entry per dependency.
    match input {
        Structure::List(entries) => assert_eq!(entries.len(), 2),
        _ => panic!("expected a list structure"),
    }
    Ok(())
}

#[test]
fn flatten_output_skips_wrappers_and_dedupes() -> TestResult {
    let store = MemoryStore::new();
    let shared = Produce::build("shared", vec![], &store)?;
    let left = Produce::build("left", vec![shared.clone()], &store)?;
    let right = Produce::build("right", vec![shared.clone()], &store)?;

    let def = TaskDef::builder("All").build();
    let wrapper = WrapperTask::new(
        def.build(TaskArgs::new())?,
        vec![left.clone(), right.clone(), shared.clone()],
    );

    let outputs = flatten_output(&wrapper);
    let mut uris: Vec<String> = outputs.iter().map(|t| t.uri()).collect();
    uris.sort();

    let mut expected = [produce_uris(&left), produce_uris(&right), produce_uris(&shared)].concat();
    expected.sort();

    // The wrapper itself contributes nothing; shared appears once even
    // though it is reachable three times.
    assert_eq!(uris, expected);
    Ok(())
}
