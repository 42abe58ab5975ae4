use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use opcua_logrecord::{encode_record, Identifier, LogRecord};
use opcua_logretriever::*;
use tokio_util::sync::CancellationToken;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
}

fn window() -> (DateTime<Utc>, DateTime<Utc>) {
    (base_time() - TimeDelta::hours(1), base_time() + TimeDelta::hours(1))
}

fn make_records(prefix: &str, n: usize) -> Vec<LogRecord> {
    (0..n)
        .map(|i| {
            LogRecord::new(
                base_time() + TimeDelta::seconds(i as i64),
                150,
                format!("{prefix} {i}"),
            )
            .with_source_name(prefix)
        })
        .collect()
}

/// A scripted response for one call. Calls beyond the script are served
/// normally.
enum Step {
    Serve,
    Status(StatusCode),
    Transport,
    Outputs(Vec<OutputArgument>),
    Hang,
    CancelAndHang(CancellationToken),
}

struct Entry {
    record: LogRecord,
    payload: RecordPayload,
}

struct LogObject {
    entries: Vec<Entry>,
    script: VecDeque<Step>,
}

impl LogObject {
    fn with_records(records: Vec<LogRecord>) -> Self {
        Self::with_payloads(records, |r| {
            RecordPayload::raw(Identifier::LOG_RECORD_TYPE, encode_record(r).unwrap())
        })
    }

    fn with_payloads(records: Vec<LogRecord>, f: impl Fn(&LogRecord) -> RecordPayload) -> Self {
        let entries = records
            .into_iter()
            .map(|record| Entry {
                payload: f(&record),
                record,
            })
            .collect();
        Self {
            entries,
            script: VecDeque::new(),
        }
    }

    fn script(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.extend(steps);
        self
    }

    /// Pages by an offset stored little-endian in the continuation point.
    fn serve(&self, inputs: &[Argument]) -> CallResult {
        let [Argument::DateTime(start), Argument::DateTime(end), Argument::UInt32(max), Argument::UInt16(min_severity), Argument::UInt32(_), Argument::ByteString(cp)] =
            inputs
        else {
            return CallResult::bad(StatusCode::BAD_INVALID_ARGUMENT);
        };
        if end < start {
            return CallResult::bad(StatusCode::BAD_INVALID_ARGUMENT);
        }

        let filtered: Vec<&Entry> = self
            .entries
            .iter()
            .filter(|e| e.record.time.is_some_and(|t| t >= *start && t <= *end))
            .filter(|e| e.record.severity >= *min_severity)
            .collect();

        let offset = match cp {
            Some(cp) if cp.len() >= 4 => u32::from_le_bytes([cp[0], cp[1], cp[2], cp[3]]) as usize,
            _ => 0,
        };
        let rest = filtered.get(offset..).unwrap_or_default();

        let max = *max as usize;
        let (page, next) = if max > 0 && rest.len() > max {
            let next = (offset + max) as u32;
            (&rest[..max], Some(Bytes::copy_from_slice(&next.to_le_bytes())))
        } else {
            (rest, None)
        };

        CallResult::good(vec![
            OutputArgument::Records(page.iter().map(|e| e.payload.clone()).collect()),
            OutputArgument::ByteString(next),
        ])
    }
}

#[derive(Debug, Clone)]
struct RecordedCall {
    object: Identifier,
    method: Identifier,
    inputs: Vec<Argument>,
}

impl RecordedCall {
    fn max_records(&self) -> u32 {
        match self.inputs[2] {
            Argument::UInt32(v) => v,
            ref other => panic!("unexpected max records argument {other:?}"),
        }
    }

    fn continuation_point(&self) -> Option<Bytes> {
        match &self.inputs[5] {
            Argument::ByteString(cp) => cp.clone(),
            other => panic!("unexpected continuation point argument {other:?}"),
        }
    }
}

#[derive(Default)]
struct MockServer {
    objects: Mutex<HashMap<Identifier, LogObject>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockServer {
    fn new() -> Self {
        Self::default()
    }

    fn with_object(self, id: Identifier, object: LogObject) -> Self {
        self.objects.lock().unwrap().insert(id, object);
        self
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, id: &Identifier) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| &c.object == id)
            .collect()
    }
}

enum Reply {
    Ready(Result<CallResult, TransportError>),
    Hang,
}

#[async_trait::async_trait]
impl MethodCaller for MockServer {
    async fn call(
        &self,
        object: &Identifier,
        method: &Identifier,
        inputs: Vec<Argument>,
    ) -> Result<CallResult, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            object: object.clone(),
            method: method.clone(),
            inputs: inputs.clone(),
        });

        let reply = {
            let mut objects = self.objects.lock().unwrap();
            match objects.get_mut(object) {
                None => Reply::Ready(Ok(CallResult::bad(StatusCode(0x8034_0000)))),
                Some(obj) => match obj.script.pop_front().unwrap_or(Step::Serve) {
                    Step::Serve => Reply::Ready(Ok(obj.serve(&inputs))),
                    Step::Status(status) => Reply::Ready(Ok(CallResult::bad(status))),
                    Step::Transport => {
                        Reply::Ready(Err(TransportError::ConnectionLost("reset".to_string())))
                    }
                    Step::Outputs(outputs) => Reply::Ready(Ok(CallResult::good(outputs))),
                    Step::Hang => Reply::Hang,
                    Step::CancelAndHang(token) => {
                        token.cancel();
                        Reply::Hang
                    }
                },
            }
        };

        match reply {
            Reply::Ready(result) => result,
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn config(max_records_per_call: u32, max_log_records: u32) -> RetrieverConfig {
    RetrieverConfig {
        max_records_per_call,
        max_log_records,
        min_severity: "debug".to_string(),
        ..Default::default()
    }
}

fn retriever(server: &Arc<MockServer>, config: RetrieverConfig) -> Retriever {
    Retriever::new(server.clone(), config).unwrap()
}

fn bodies(collection: &Collection) -> Vec<String> {
    collection.records.iter().map(|r| r.body.clone()).collect()
}

fn messages(prefix: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{prefix} {i}")).collect()
}

async fn collect(retriever: &Retriever, sources: &[Identifier]) -> Collection {
    let (start, end) = window();
    retriever
        .collect(sources, start, end, &CancellationToken::new())
        .await
}

#[tokio::test]
async fn test_pagination_issues_ceil_n_over_m_calls() {
    init_logger();
    let source = Identifier::SERVER_LOG;

    for (n, m, expected_calls) in [(25, 10, 3), (20, 10, 2), (5, 10, 1), (1, 1, 1), (7, 1, 7)] {
        let server = Arc::new(
            MockServer::new().with_object(source.clone(), LogObject::with_records(make_records("r", n))),
        );
        let collection = collect(&retriever(&server, config(m, 1000)), &[source.clone()]).await;

        assert_eq!(bodies(&collection), messages("r", 0..n), "n={n} m={m}");
        assert_eq!(server.calls().len(), expected_calls, "n={n} m={m}");
        assert_eq!(collection.sources[0].calls as usize, expected_calls);
        assert_eq!(collection.sources[0].records, n);
        assert!(collection.sources[0].is_done());
    }
}

#[tokio::test]
async fn test_continuation_points_are_echoed() {
    let source = Identifier::SERVER_LOG;
    let server = Arc::new(
        MockServer::new().with_object(source.clone(), LogObject::with_records(make_records("r", 25))),
    );
    collect(&retriever(&server, config(10, 1000)), &[source]).await;

    let cps: Vec<_> = server.calls().iter().map(RecordedCall::continuation_point).collect();
    assert_eq!(
        cps,
        vec![
            None,
            Some(Bytes::from_static(&[10, 0, 0, 0])),
            Some(Bytes::from_static(&[20, 0, 0, 0])),
        ]
    );
    for call in server.calls() {
        assert_eq!(call.method, Identifier::GET_RECORDS_METHOD);
        assert_eq!(call.inputs[4], Argument::UInt32(0x1F));
    }
}

#[tokio::test]
async fn test_quota_is_split_across_sources() {
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let server = Arc::new(
        MockServer::new()
            .with_object(a.clone(), LogObject::with_records(make_records("a", 8)))
            .with_object(b.clone(), LogObject::with_records(make_records("b", 8))),
    );
    let collection = collect(&retriever(&server, config(100, 10)), &[a.clone(), b.clone()]).await;

    // 10 records over 2 sources: 5 each, fetched in a single call.
    let mut expected = messages("a", 0..5);
    expected.extend(messages("b", 0..5));
    assert_eq!(bodies(&collection), expected);
    assert_eq!(server.calls_to(&a).len(), 1);
    assert_eq!(server.calls_to(&a)[0].max_records(), 5);
    assert_eq!(server.calls_to(&b).len(), 1);
}

#[tokio::test]
async fn test_per_call_cap_shrinks_to_remaining_quota() {
    let source = Identifier::SERVER_LOG;
    let server = Arc::new(
        MockServer::new().with_object(source.clone(), LogObject::with_records(make_records("r", 30))),
    );
    let collection = collect(&retriever(&server, config(10, 25)), &[source]).await;

    assert_eq!(bodies(&collection), messages("r", 0..25));
    let caps: Vec<_> = server.calls().iter().map(RecordedCall::max_records).collect();
    assert_eq!(caps, vec![10, 10, 5]);
}

#[tokio::test]
async fn test_stale_continuation_point_restarts_once() {
    init_logger();
    let source = Identifier::SERVER_LOG;
    let object = LogObject::with_records(make_records("r", 25)).script([
        Step::Serve,
        Step::Status(StatusCode::BAD_CONTINUATION_POINT_INVALID),
    ]);
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 1000)), &[source]).await;

    // Every record exactly once, in order.
    assert_eq!(bodies(&collection), messages("r", 0..25));
    let report = &collection.sources[0];
    assert!(report.is_done());
    assert_eq!(report.calls, 5);

    let cps: Vec<_> = server.calls().iter().map(RecordedCall::continuation_point).collect();
    assert_eq!(cps[1], Some(Bytes::from_static(&[10, 0, 0, 0])));
    assert_eq!(cps[2], None);
}

#[tokio::test]
async fn test_stale_on_first_call_restarts_too() {
    let source = Identifier::SERVER_LOG;
    let object = LogObject::with_records(make_records("r", 3))
        .script([Step::Status(StatusCode::BAD_CONTINUATION_POINT_INVALID)]);
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 1000)), &[source]).await;

    assert_eq!(bodies(&collection), messages("r", 0..3));
    assert_eq!(collection.sources[0].calls, 2);
}

#[tokio::test]
async fn test_second_stale_skips_source() {
    init_logger();
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let stale = || Step::Status(StatusCode::BAD_CONTINUATION_POINT_INVALID);
    let server = Arc::new(
        MockServer::new()
            .with_object(
                a.clone(),
                LogObject::with_records(make_records("a", 25)).script([
                    Step::Serve,
                    stale(),
                    Step::Serve,
                    stale(),
                ]),
            )
            .with_object(b.clone(), LogObject::with_records(make_records("b", 4))),
    );
    let collection = collect(&retriever(&server, config(10, 1000)), &[a.clone(), b.clone()]).await;

    assert_eq!(bodies(&collection), messages("b", 0..4));
    assert_eq!(
        collection.sources[0].outcome,
        SourceOutcome::Failed(SourceError::StaleContinuationPoint)
    );
    assert_eq!(collection.sources[0].records, 0);
    assert_eq!(collection.sources[0].calls, 4);
    assert!(collection.sources[1].is_done());
    assert!(!collection.all_failed());
}

#[tokio::test]
async fn test_invalid_argument_is_not_retried() {
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let server = Arc::new(
        MockServer::new()
            .with_object(
                a.clone(),
                LogObject::with_records(make_records("a", 3))
                    .script([Step::Status(StatusCode::BAD_INVALID_ARGUMENT)]),
            )
            .with_object(b.clone(), LogObject::with_records(make_records("b", 2))),
    );
    let collection = collect(&retriever(&server, config(10, 1000)), &[a.clone(), b]).await;

    assert_eq!(server.calls_to(&a).len(), 1);
    assert_eq!(
        collection.sources[0].outcome,
        SourceOutcome::Failed(SourceError::InvalidArgument)
    );
    assert_eq!(bodies(&collection), messages("b", 0..2));
}

#[tokio::test]
async fn test_failures_keep_earlier_pages() {
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let c = Identifier::numeric(2, 3);
    let server = Arc::new(
        MockServer::new()
            .with_object(
                a.clone(),
                LogObject::with_records(make_records("a", 25))
                    .script([Step::Serve, Step::Status(StatusCode::BAD_UNEXPECTED_ERROR)]),
            )
            .with_object(
                b.clone(),
                LogObject::with_records(make_records("b", 5)).script([Step::Transport]),
            )
            .with_object(
                c.clone(),
                LogObject::with_records(make_records("c", 5)).script([Step::Outputs(vec![
                    OutputArgument::Records(vec![]),
                ])]),
            ),
    );
    let collection = collect(&retriever(&server, config(10, 3000)), &[a, b, c]).await;

    assert_eq!(bodies(&collection), messages("a", 0..10));
    assert_eq!(
        collection.sources[0].outcome,
        SourceOutcome::Failed(SourceError::BadStatus(StatusCode::BAD_UNEXPECTED_ERROR))
    );
    assert_eq!(collection.sources[0].records, 10);
    assert_matches!(
        collection.sources[1].outcome,
        SourceOutcome::Failed(SourceError::Transport(TransportError::ConnectionLost(_)))
    );
    assert_eq!(
        collection.sources[2].outcome,
        SourceOutcome::Failed(SourceError::MissingOutputs(1))
    );
    assert!(collection.all_failed());
    assert_eq!(collection.failed().count(), 3);
}

#[tokio::test]
async fn test_null_records_output_is_empty() {
    let source = Identifier::SERVER_LOG;
    let object = LogObject::with_records(make_records("r", 3)).script([Step::Outputs(vec![
        OutputArgument::Null,
        OutputArgument::ByteString(None),
    ])]);
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 1000)), &[source]).await;

    assert!(collection.records.is_empty());
    assert!(collection.sources[0].is_done());
    assert_eq!(collection.sources[0].calls, 1);
}

#[tokio::test]
async fn test_bad_record_is_skipped() {
    init_logger();
    let source = Identifier::SERVER_LOG;
    let object = LogObject::with_payloads(make_records("r", 5), |r| {
        if r.message == "r 2" {
            RecordPayload::raw(Identifier::LOG_RECORD_TYPE, Bytes::from_static(&[0xde, 0xad]))
        } else {
            RecordPayload::raw(Identifier::LOG_RECORD_TYPE, encode_record(r).unwrap())
        }
    });
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 1000)), &[source]).await;

    assert_eq!(bodies(&collection), vec!["r 0", "r 1", "r 3", "r 4"]);
    let report = &collection.sources[0];
    assert!(report.is_done());
    assert_eq!(report.records, 4);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_mixed_payload_kinds() {
    let source = Identifier::SERVER_LOG;
    let object = LogObject::with_payloads(make_records("r", 3), |r| match r.message.as_str() {
        "r 0" => RecordPayload::structured(r.clone()),
        // Registered under a server-specific namespace.
        "r 1" => RecordPayload::raw(Identifier::numeric(3, 5001), encode_record(r).unwrap()),
        _ => RecordPayload::raw(Identifier::LOG_RECORD_TYPE, encode_record(r).unwrap()),
    });
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 1000)), &[source]).await;

    assert_eq!(bodies(&collection), messages("r", 0..3));
    assert_eq!(collection.sources[0].skipped, 0);
    let first = &collection.records[0];
    assert_eq!(first.severity_text(), "Notice");
    assert_eq!(first.source_name.as_deref(), Some("r"));
}

#[tokio::test]
async fn test_min_severity_is_sent() {
    let source = Identifier::SERVER_LOG;
    let mut records = make_records("low", 2);
    records.push(LogRecord::new(base_time(), 250, "high"));
    let server = Arc::new(
        MockServer::new().with_object(source.clone(), LogObject::with_records(records)),
    );
    let cfg = RetrieverConfig {
        min_severity: "error".to_string(),
        ..config(10, 1000)
    };
    let collection = collect(&retriever(&server, cfg), &[source]).await;

    assert_eq!(server.calls()[0].inputs[3], Argument::UInt16(201));
    assert_eq!(bodies(&collection), vec!["high"]);
}

#[tokio::test]
async fn test_custom_method_id() {
    let source = Identifier::text(2, "Boiler.Log");
    let method: Identifier = "ns=2;s=Boiler.Log.GetRecords".parse().unwrap();
    let server = Arc::new(
        MockServer::new().with_object(source.clone(), LogObject::with_records(make_records("r", 1))),
    );
    let retriever = retriever(&server, config(10, 1000)).with_method(method.clone());
    collect(&retriever, &[source]).await;

    assert_eq!(server.calls()[0].method, method);
}

#[tokio::test]
async fn test_reversed_window_fails_every_source() {
    init_logger();
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let server = Arc::new(
        MockServer::new()
            .with_object(a.clone(), LogObject::with_records(make_records("a", 1)))
            .with_object(b.clone(), LogObject::with_records(make_records("b", 1))),
    );
    let (start, end) = window();
    let collection = retriever(&server, config(10, 1000))
        .collect(&[a.clone(), b.clone()], end, start, &CancellationToken::new())
        .await;

    assert!(collection.records.is_empty());
    assert!(collection.all_failed());
    let sources: Vec<_> = collection.sources.iter().map(|s| s.source.clone()).collect();
    assert_eq!(sources, vec![a, b]);
    for report in &collection.sources {
        assert_eq!(report.outcome, SourceOutcome::Failed(SourceError::InvalidArgument));
        assert_eq!(report.calls, 0);
    }
    assert!(server.calls().is_empty());
}

/// Answers every call with an empty page and the same continuation point.
#[derive(Default)]
struct EmptyPages {
    calls: Mutex<u32>,
}

#[async_trait::async_trait]
impl MethodCaller for EmptyPages {
    async fn call(
        &self,
        _object: &Identifier,
        _method: &Identifier,
        _inputs: Vec<Argument>,
    ) -> Result<CallResult, TransportError> {
        *self.calls.lock().unwrap() += 1;
        Ok(CallResult::good(vec![
            OutputArgument::Records(vec![]),
            OutputArgument::ByteString(Some(Bytes::from_static(&[1]))),
        ]))
    }
}

#[tokio::test]
async fn test_empty_page_with_continuation_point_ends_source() {
    init_logger();
    let server = Arc::new(EmptyPages::default());
    let retriever = Retriever::new(server.clone(), config(10, 1000)).unwrap();
    let (start, end) = window();
    let collection = tokio::time::timeout(
        Duration::from_secs(5),
        retriever.collect(&[Identifier::SERVER_LOG], start, end, &CancellationToken::new()),
    )
    .await
    .expect("pagination did not terminate");

    assert!(collection.records.is_empty());
    assert!(collection.sources[0].is_done());
    assert_eq!(collection.sources[0].calls, 1);
    assert_eq!(*server.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_repeated_continuation_point_ends_source() {
    let source = Identifier::SERVER_LOG;
    let extra = make_records("x", 1).remove(0);
    // The first page hands out offset 10; the second repeats it.
    let object = LogObject::with_records(make_records("r", 30)).script([
        Step::Serve,
        Step::Outputs(vec![
            OutputArgument::Records(vec![RecordPayload::structured(extra)]),
            OutputArgument::ByteString(Some(Bytes::copy_from_slice(&10u32.to_le_bytes()))),
        ]),
    ]);
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 1000)), &[source]).await;

    let mut expected = messages("r", 0..10);
    expected.push("x 0".to_string());
    assert_eq!(bodies(&collection), expected);
    assert!(collection.sources[0].is_done());
    assert_eq!(collection.sources[0].calls, 2);
}

#[tokio::test]
async fn test_oversized_page_is_truncated_to_request() {
    let source = Identifier::SERVER_LOG;
    let payloads = make_records("x", 5)
        .into_iter()
        .map(RecordPayload::structured)
        .collect();
    let object = LogObject::with_records(vec![]).script([Step::Outputs(vec![
        OutputArgument::Records(payloads),
        OutputArgument::ByteString(None),
    ])]);
    let server = Arc::new(MockServer::new().with_object(source.clone(), object));
    let collection = collect(&retriever(&server, config(10, 3)), &[source]).await;

    assert_eq!(server.calls()[0].max_records(), 3);
    assert_eq!(bodies(&collection), messages("x", 0..3));
    assert_eq!(collection.sources[0].records, 3);
}

#[tokio::test]
async fn test_cancellation_keeps_collected_records() {
    init_logger();
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let token = CancellationToken::new();
    let server = Arc::new(
        MockServer::new()
            .with_object(
                a.clone(),
                LogObject::with_records(make_records("a", 25))
                    .script([Step::Serve, Step::CancelAndHang(token.clone())]),
            )
            .with_object(b.clone(), LogObject::with_records(make_records("b", 5))),
    );
    let (start, end) = window();
    let collection = retriever(&server, config(10, 1000))
        .collect(&[a.clone(), b.clone()], start, end, &token)
        .await;

    assert_eq!(bodies(&collection), messages("a", 0..10));
    assert_eq!(
        collection.sources[0].outcome,
        SourceOutcome::Failed(SourceError::Cancelled)
    );
    assert_eq!(collection.sources[0].calls, 2);
    assert_eq!(
        collection.sources[1].outcome,
        SourceOutcome::Failed(SourceError::Cancelled)
    );
    assert_eq!(collection.sources[1].calls, 0);
    assert!(server.calls_to(&b).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fails_only_that_source() {
    let a = Identifier::numeric(2, 1);
    let b = Identifier::numeric(2, 2);
    let server = Arc::new(
        MockServer::new()
            .with_object(
                a.clone(),
                LogObject::with_records(make_records("a", 3)).script([Step::Hang]),
            )
            .with_object(b.clone(), LogObject::with_records(make_records("b", 3))),
    );
    let cfg = RetrieverConfig {
        request_timeout: Duration::from_millis(250),
        ..config(10, 1000)
    };
    let collection = collect(&retriever(&server, cfg), &[a, b]).await;

    assert_eq!(
        collection.sources[0].outcome,
        SourceOutcome::Failed(SourceError::Timeout(Duration::from_millis(250)))
    );
    assert_eq!(bodies(&collection), messages("b", 0..3));
}

#[tokio::test]
async fn test_cursor_driven_cycles() {
    let source = Identifier::SERVER_LOG;
    let server = Arc::new(
        MockServer::new().with_object(source.clone(), LogObject::with_records(make_records("r", 20))),
    );
    let retriever = retriever(&server, config(100, 1000));
    let token = CancellationToken::new();

    // First cycle covers the ten seconds before now: records 0..=10.
    let now = base_time() + TimeDelta::seconds(10);
    let mut cursor = CollectionCursor::new(Duration::from_secs(10), now);
    let (start, end) = cursor.window(now);
    let first = retriever
        .collect(&[source.clone()], start, end, &token)
        .await;
    assert_eq!(bodies(&first), messages("r", 0..11));
    cursor.commit(end);

    let now = base_time() + TimeDelta::seconds(15);
    let (start, end) = cursor.window(now);
    assert_eq!(start, base_time() + TimeDelta::seconds(10));
    let second = retriever.collect(&[source], start, end, &token).await;
    // Both bounds are inclusive on the server.
    assert_eq!(bodies(&second), messages("r", 10..16));
}

#[test]
fn test_invalid_config_rejected() {
    let server = Arc::new(MockServer::new());
    let cfg = RetrieverConfig {
        max_records_per_call: 0,
        ..Default::default()
    };
    assert_matches!(
        Retriever::new(server, cfg).err(),
        Some(ConfigError::MaxRecordsPerCall { got: 0, .. })
    );
}
