use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use swiftmap_core::{
    Adapter, AdapterError, ExecutionError, Field, FieldMapping, FieldType, PreparedStatement,
    ResourceState, Row, Scheme, StatementFactory, StatementKind, StatementResult, Value,
};

/// What the recording factory's statements answer with.
#[derive(Clone, Copy)]
enum Reply {
    Normal,
    NoRows,
    NoInsertId,
    Fail,
    /// Fails the n-th execution (1-based) and answers normally otherwise.
    FailAt(usize),
}

#[derive(Default)]
struct Journal {
    prepared: Mutex<HashMap<(String, StatementKind), usize>>,
    executed: Mutex<Vec<(StatementKind, Vec<Option<Value>>)>>,
    next_id: AtomicI64,
}

impl Journal {
    fn prepare_count(&self, store: &str, kind: StatementKind) -> usize {
        self.prepared
            .lock()
            .unwrap()
            .get(&(store.to_string(), kind))
            .copied()
            .unwrap_or(0)
    }

    fn total_prepared(&self) -> usize {
        self.prepared.lock().unwrap().values().sum()
    }

    fn executed(&self) -> Vec<(StatementKind, Vec<Option<Value>>)> {
        self.executed.lock().unwrap().clone()
    }
}

struct RecordingFactory {
    journal: Arc<Journal>,
    reply: Reply,
    prepare_calls: AtomicUsize,
}

impl RecordingFactory {
    fn new(reply: Reply) -> (Self, Arc<Journal>) {
        let journal = Arc::new(Journal::default());
        let factory = Self {
            journal: Arc::clone(&journal),
            reply,
            prepare_calls: AtomicUsize::new(0),
        };
        (factory, journal)
    }

    fn build(&self, scheme: &Scheme, kind: StatementKind) -> Result<RecordingStatement, ExecutionError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        // Widen the race window for the concurrency test.
        thread::sleep(std::time::Duration::from_millis(5));
        *self
            .journal
            .prepared
            .lock()
            .unwrap()
            .entry((scheme.store().to_string(), kind))
            .or_default() += 1;
        Ok(RecordingStatement {
            journal: Arc::clone(&self.journal),
            kind,
            reply: self.reply,
            columns: scheme
                .header()
                .fields()
                .iter()
                .map(|field| field.name().to_string())
                .collect(),
        })
    }
}

impl StatementFactory for RecordingFactory {
    type Statement = RecordingStatement;

    fn prepare_get(&self, scheme: &Scheme) -> Result<RecordingStatement, ExecutionError> {
        self.build(scheme, StatementKind::Get)
    }

    fn prepare_create(&self, scheme: &Scheme) -> Result<RecordingStatement, ExecutionError> {
        self.build(scheme, StatementKind::Create)
    }

    fn prepare_update(&self, scheme: &Scheme) -> Result<RecordingStatement, ExecutionError> {
        self.build(scheme, StatementKind::Update)
    }

    fn prepare_delete(&self, scheme: &Scheme) -> Result<RecordingStatement, ExecutionError> {
        self.build(scheme, StatementKind::Delete)
    }
}

struct RecordingStatement {
    journal: Arc<Journal>,
    kind: StatementKind,
    reply: Reply,
    columns: Vec<String>,
}

impl PreparedStatement for RecordingStatement {
    fn execute(&self, params: &[Option<Value>]) -> Result<StatementResult, ExecutionError> {
        let call = {
            let mut executed = self.journal.executed.lock().unwrap();
            executed.push((self.kind, params.to_vec()));
            executed.len()
        };

        match (self.reply, self.kind) {
            (Reply::Fail, _) => Err(ExecutionError::message("disk I/O error")),
            (Reply::FailAt(n), _) if n == call => Err(ExecutionError::message("disk I/O error")),
            (_, StatementKind::Get) => {
                let rows = match self.reply {
                    Reply::NoRows => Vec::new(),
                    _ => vec![Row::new(
                        self.columns
                            .iter()
                            .map(|name| {
                                let value = match name.as_str() {
                                    "id" => params[0].clone(),
                                    "name" => Some(Value::from("stored")),
                                    _ => None,
                                };
                                (name.clone(), value)
                            })
                            .collect(),
                    )],
                };
                Ok(StatementResult::rows(rows))
            }
            (Reply::NoInsertId, StatementKind::Create) => Ok(StatementResult::write(1, None)),
            (_, StatementKind::Create) => {
                let id = self.journal.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(StatementResult::write(1, Some(id)))
            }
            (Reply::NoRows, _) => Ok(StatementResult::write(0, None)),
            _ => Ok(StatementResult::write(1, None)),
        }
    }
}

fn user_scheme() -> Arc<Scheme> {
    Scheme::new(
        "users",
        vec![
            Field::new("id", FieldType::Integer).serial(),
            Field::new("name", FieldType::Text),
            Field::new("email", FieldType::Text),
        ],
    )
    .unwrap()
}

fn person(name: &str) -> FieldMapping {
    FieldMapping::new().with("name", name).with("email", "x@y")
}

#[test]
fn each_scheme_and_kind_is_prepared_once() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    let mut first = adapter.create_one(&users, person("A")).unwrap();
    let second = adapter.create_one(&users, person("B")).unwrap();
    adapter.update_one(&users, first.clone()).unwrap();
    adapter.update_one(&users, second).unwrap();
    let keys = FieldMapping::new().with("id", 1);
    adapter.get(&users, &keys).unwrap();
    adapter.get(&users, &keys).unwrap();
    adapter.delete_one(&users, &mut first).unwrap();

    for kind in [
        StatementKind::Get,
        StatementKind::Create,
        StatementKind::Update,
        StatementKind::Delete,
    ] {
        assert_eq!(journal.prepare_count("users", kind), 1, "kind={kind}");
    }
    assert_eq!(adapter.cached_statements(), 4);
    assert_eq!(adapter.factory().prepare_calls.load(Ordering::SeqCst), 4);
}

#[test]
fn concurrent_first_use_prepares_once() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Arc::new(Adapter::new(factory));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let adapter = Arc::clone(&adapter);
            let barrier = Arc::clone(&barrier);
            let users = Arc::clone(&users);
            thread::spawn(move || {
                barrier.wait();
                adapter
                    .create_one(&users, person(&format!("user-{index}")))
                    .unwrap()
                    .get("id")
                    .and_then(Value::as_i64)
                    .unwrap()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids.len(), 8, "insert ids must never alias");
    assert_eq!(journal.prepare_count("users", StatementKind::Create), 1);
    assert_eq!(journal.total_prepared(), 1);
}

#[test]
fn parameters_follow_statement_kind_order() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    let mut user = adapter.create_one(&users, person("A")).unwrap();
    user.set("name", "B").unwrap();
    let mut user = adapter.update_one(&users, user).unwrap();
    adapter.delete_one(&users, &mut user).unwrap();

    let executed = journal.executed();
    assert_eq!(
        executed,
        vec![
            (
                StatementKind::Create,
                vec![Some(Value::from("A")), Some(Value::from("x@y"))]
            ),
            (
                StatementKind::Update,
                vec![
                    Some(Value::from("B")),
                    Some(Value::from("x@y")),
                    Some(Value::Integer(1)),
                ]
            ),
            (StatementKind::Delete, vec![Some(Value::Integer(1))]),
        ]
    );
}

#[test]
fn absent_values_are_bound_as_none() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    adapter
        .create_one(&users, FieldMapping::new().with("name", "A"))
        .unwrap();
    assert_eq!(
        journal.executed()[0].1,
        vec![Some(Value::from("A")), None]
    );
}

#[test]
fn incomplete_key_fails_before_any_execution() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    let err = adapter.update_one(&users, person("A")).unwrap_err();
    assert!(matches!(err, AdapterError::IncompleteKey { .. }));
    assert_eq!(err.code(), "incomplete_key");

    let mut keyless = users.resource(person("A")).unwrap();
    let err = adapter.delete_one(&users, &mut keyless).unwrap_err();
    assert!(matches!(err, AdapterError::IncompleteKey { .. }));

    assert!(journal.executed().is_empty());
}

#[test]
fn update_batch_stops_at_first_incomplete_key() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    let first = users.resource(person("A").with("id", 1)).unwrap();
    let keyless = users.resource(person("B")).unwrap();
    let third = users.resource(person("C").with("id", 3)).unwrap();

    let err = adapter
        .update(&users, vec![first, keyless, third])
        .unwrap_err();
    assert!(matches!(err, AdapterError::IncompleteKey { .. }));

    let executed = journal.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].1.last(), Some(&Some(Value::Integer(1))));
}

#[test]
fn delete_returns_raw_outcome_and_freezes_even_when_nothing_matched() {
    let users = user_scheme();
    let (factory, _journal) = RecordingFactory::new(Reply::NoRows);
    let adapter = Adapter::new(factory);

    let mut resource = users.resource(person("A").with("id", 7)).unwrap();
    let outcome = adapter.delete_one(&users, &mut resource).unwrap();
    assert_eq!(outcome.affected_rows(), 0);
    assert_eq!(outcome.row_count(), 0);
    assert!(resource.is_deleted());
}

#[test]
fn failed_delete_execution_does_not_freeze() {
    let users = user_scheme();
    let (factory, _journal) = RecordingFactory::new(Reply::Fail);
    let adapter = Adapter::new(factory);

    let mut resource = users.resource(person("A").with("id", 7)).unwrap();
    let err = adapter.delete_one(&users, &mut resource).unwrap_err();
    assert!(matches!(err, AdapterError::Execution(_)));
    assert!(!resource.is_deleted());
    resource.set("name", "B").unwrap();
}

#[test]
fn create_batch_stops_at_first_execution_failure() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::FailAt(2));
    let adapter = Adapter::new(factory);

    let err = adapter
        .create_many(&users, vec![person("A"), person("B"), person("C")])
        .unwrap_err();
    assert!(matches!(err, AdapterError::Execution(_)));

    let executed = journal.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[0].1[0], Some(Value::from("A")));
    assert_eq!(executed[1].1[0], Some(Value::from("B")));
    assert_eq!(journal.next_id.load(Ordering::SeqCst), 1);
}

#[test]
fn delete_batch_stops_at_first_incomplete_key() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    let mut first = users.resource(person("A").with("id", 1)).unwrap();
    let mut keyless = users.resource(person("B")).unwrap();
    let mut third = users.resource(person("C").with("id", 3)).unwrap();

    let err = adapter
        .delete(&users, vec![&mut first, &mut keyless, &mut third])
        .unwrap_err();
    assert!(matches!(err, AdapterError::IncompleteKey { .. }));

    assert!(first.is_deleted());
    assert!(!keyless.is_deleted());
    assert_eq!(third.state(), ResourceState::Live);
    assert_eq!(
        journal.executed(),
        vec![(StatementKind::Delete, vec![Some(Value::Integer(1))])]
    );
}

#[test]
fn get_with_no_rows_returns_none() {
    let users = user_scheme();
    let (factory, _journal) = RecordingFactory::new(Reply::NoRows);
    let adapter = Adapter::new(factory);

    let loaded = adapter
        .get(&users, &FieldMapping::new().with("id", 9))
        .unwrap();
    assert!(loaded.is_none());
}

#[test]
fn get_materializes_first_row_without_defaults() {
    let users = user_scheme();
    let (factory, _journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    let loaded = adapter
        .get(&users, &FieldMapping::new().with("id", 9))
        .unwrap()
        .unwrap();
    assert_eq!(loaded.get("id"), Some(&Value::Integer(9)));
    assert_eq!(loaded.get("name"), Some(&Value::from("stored")));
    assert_eq!(loaded.get("email"), None);
}

#[test]
fn execution_errors_propagate_unchanged() {
    let users = user_scheme();
    let (factory, _journal) = RecordingFactory::new(Reply::Fail);
    let adapter = Adapter::new(factory);

    let err = adapter.create_one(&users, person("A")).unwrap_err();
    match err {
        AdapterError::Execution(inner) => assert_eq!(inner.to_string(), "disk I/O error"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn serial_create_without_insert_id_is_an_error() {
    let users = user_scheme();
    let (factory, _journal) = RecordingFactory::new(Reply::NoInsertId);
    let adapter = Adapter::new(factory);

    let err = adapter.create_one(&users, person("A")).unwrap_err();
    assert!(matches!(err, AdapterError::MissingInsertId { ref scheme } if scheme == "users"));
}

#[test]
fn clear_statements_forces_repreparation() {
    let users = user_scheme();
    let (factory, journal) = RecordingFactory::new(Reply::Normal);
    let adapter = Adapter::new(factory);

    adapter.create_one(&users, person("A")).unwrap();
    adapter.clear_statements();
    assert_eq!(adapter.cached_statements(), 0);
    adapter.create_one(&users, person("B")).unwrap();

    assert_eq!(journal.prepare_count("users", StatementKind::Create), 2);
}
