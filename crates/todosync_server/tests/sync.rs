//! End-to-end tests driving the dispatcher with resolver events.

use serde_json::json;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use todosync_protocol::{Checkpoint, PullBulk, PushResponse, PushRow, Todo};
use todosync_server::{ServerConfig, SyncServer};
use todosync_storage::{Collection, Connector, FileStore};
use todosync_testkit::prelude::*;

const RACERS: usize = 8;

fn push_via_event<C: Connector>(server: &SyncServer<C>, rows: &[PushRow]) -> PushResponse {
    let body = server.handle_event(&push_event(rows)).unwrap();
    serde_json::from_value(body).unwrap()
}

fn pull_via_event<C: Connector>(server: &SyncServer<C>, since: Option<&Checkpoint>) -> PullBulk {
    let body = server.handle_event(&pull_event(since)).unwrap();
    serde_json::from_value(body).unwrap()
}

#[test]
fn insert_on_empty_store_then_pull() {
    let server = TestServer::memory();

    let response = push_via_event(&server, &[insert_row("5", "New")]);
    assert_eq!(response.changes.len(), 1);
    assert_eq!(response.changes[0].id, "5");
    assert_eq!(response.change_action.len(), 1);
    assert_eq!(response.change_action[0].as_str(), "inserted");
    assert!(response.conflicts.is_empty());
    assert_eq!(response.conflict_message, "No conflicts");

    let bulk = pull_via_event(&server, None);
    assert!(bulk.documents.iter().any(|d| d.id == "5"));
    assert_eq!(bulk.checkpoint.id, "5");
}

#[test]
fn stale_assumption_reports_server_document() {
    let server = TestServer::memory();
    server.push_ok(vec![PushRow::new(todo_input("1", "Buy groceries", true))]);
    let before = server.store().records();

    let row = PushRow::assuming(
        todo_input("1", "Buy groceries", false),
        todo_input("1", "Buy groceries", false),
    );
    let response = push_via_event(&server, &[row]);

    assert_eq!(response.conflict_message, "Conflicts detected");
    assert_eq!(
        response.conflicts,
        vec![Todo {
            id: "1".into(),
            name: "Buy groceries".into(),
            done: true,
            timestamp: FIXTURE_TIMESTAMP.into(),
            deleted: false,
        }]
    );
    assert!(response.changes.is_empty());
    assert_eq!(server.store().records(), before);
}

#[test]
fn soft_deleted_documents_leave_pulls() {
    let server = TestServer::memory();
    server.push_ok(vec![insert_row("1", "keep"), insert_row("2", "drop")]);
    let (_, checkpoint) = server.pull_all(None);

    let response = server.push_ok(vec![PushRow::new(
        todo_input("2", "drop", false).with_deleted(true),
    )]);
    assert_eq!(response.change_action[0].as_str(), "delete");

    // Full pull hides the deleted document.
    let bulk = server.pull(None).unwrap();
    let ids: Vec<_> = bulk.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["1"]);

    // Incremental pull advances past it without returning it.
    let bulk = server.pull(Some(checkpoint)).unwrap();
    assert!(bulk.documents.is_empty());
    assert_eq!(bulk.checkpoint.id, "2");

    // The record is still stored.
    assert_eq!(server.store().records().len(), 2);
}

#[test]
fn repeated_push_is_idempotent() {
    let server = TestServer::memory();
    let row = insert_row("1", "once");

    let first = push_via_event(&server, &[row.clone()]);
    let checkpoint = server.checkpoint().unwrap();
    let second = push_via_event(&server, &[row]);

    assert_eq!(first.changes.len(), 1);
    assert!(second.changes.is_empty());
    assert!(second.change_action.is_empty());
    assert_eq!(server.checkpoint().unwrap(), checkpoint);
}

#[test]
fn checkpoint_follows_last_write() {
    let server = TestServer::memory();
    let mut previous = server.checkpoint().unwrap();

    for (i, name) in ["a", "b", "c", "a"].iter().enumerate() {
        server.push_ok(vec![PushRow::new(todo_input(name, &format!("v{i}"), false))]);
        let checkpoint = server.checkpoint().unwrap();
        assert!(previous.is_before(&checkpoint));
        assert_eq!(checkpoint.id, *name);

        let stored = server
            .store()
            .records()
            .into_iter()
            .find(|r| r.key.as_str() == *name)
            .unwrap();
        assert_eq!(stored.updated_at, checkpoint.updated_at);
        previous = checkpoint;
    }
}

#[test]
fn pulls_paginate_by_limit() {
    let server = TestServer::memory_with(ServerConfig::default().with_pull_limit(3));
    let rows: Vec<_> = (1..=7).map(|i| insert_row(&i.to_string(), "x")).collect();
    server.push_ok(rows);

    let first = server.pull(None).unwrap();
    assert_eq!(first.documents.len(), 3);
    assert_eq!(first.checkpoint.id, "3");

    let (rest, checkpoint) = server.pull_all(Some(first.checkpoint));
    let ids: Vec<_> = rest.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "5", "6", "7"]);
    assert_eq!(checkpoint, server.checkpoint().unwrap());
}

#[test]
fn up_to_date_pull_echoes_checkpoint() {
    let server = TestServer::memory();
    server.push_ok(vec![insert_row("1", "a")]);
    let checkpoint = server.checkpoint().unwrap();

    let body = server.handle_event(&pull_event(Some(&checkpoint))).unwrap();
    assert_eq!(body["documents"], json!([]));
    assert_eq!(body["checkpoint"], serde_json::to_value(&checkpoint).unwrap());
}

/// Row that every racer sends: the same assumed state, its own new state.
fn racing_row(racer: usize) -> PushRow {
    PushRow::assuming(
        todo_input("1", "seed", false),
        todo_input("1", &format!("racer {racer}"), true),
    )
}

/// Checks that exactly one racer wrote and every other one got the
/// winner's document back as a conflict.
fn assert_single_winner(responses: &[PushResponse], stored_name: &str) {
    let winners: Vec<_> = responses.iter().filter(|r| r.has_changes()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].changes[0].name, stored_name);

    let conflicts: usize = responses.iter().map(|r| r.conflicts.len()).sum();
    assert_eq!(conflicts, responses.len() - 1);
    for response in responses.iter().filter(|r| !r.has_changes()) {
        assert_eq!(response.conflict_message, "Conflicts detected");
        assert_eq!(response.conflicts[0].name, stored_name);
    }
}

#[test]
fn concurrent_pushes_with_same_assumption_apply_once() {
    let server = Arc::new(TestServer::memory());
    server.push_ok(vec![insert_row("1", "seed")]);
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|racer| {
            let server = Arc::clone(&server);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                server.push(vec![racing_row(racer)]).unwrap()
            })
        })
        .collect();
    let responses: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let records = server.store().records();
    assert_eq!(records.len(), 1);
    assert_single_winner(&responses, &records[0].name);
    assert_eq!(server.store().open_connections(), 0);
}

#[test]
fn concurrent_pushes_across_file_servers_apply_once() {
    let first = TestServer::file();
    first.push_ok(vec![insert_row("1", "seed")]);

    // Half the racers share one server, the rest each open the log again.
    let reopened: Vec<SyncServer<FileStore>> = (0..RACERS / 2).map(|_| first.reopen()).collect();
    let mut servers: Vec<&SyncServer<FileStore>> = reopened.iter().collect();
    while servers.len() < RACERS {
        servers.push(&first.server);
    }
    let barrier = Barrier::new(RACERS);

    let responses: Vec<PushResponse> = thread::scope(|scope| {
        let handles: Vec<_> = servers
            .iter()
            .enumerate()
            .map(|(racer, server)| {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    server.push(vec![racing_row(racer)]).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let (documents, _) = first.pull_all(None);
    assert_eq!(documents.len(), 1);
    assert_single_winner(&responses, &documents[0].name);

    // One line for the seed, one for the winning write.
    let log = fs::read_to_string(first.store_path().unwrap()).unwrap();
    assert_eq!(log.lines().count(), 2);
}

#[test]
fn stream_is_read_from_the_shared_store() {
    let first = TestServer::file();
    let second = first.reopen();

    first.push_ok(vec![insert_row("1", "v1")]);
    second
        .push(vec![
            insert_row("1", "v2"),
            PushRow::new(todo_input("2", "gone", false).with_deleted(true)),
        ])
        .unwrap();

    let from_first = first.stream().unwrap();
    let from_second = second.stream().unwrap();
    assert_eq!(from_first, from_second);
    assert_eq!(from_first.documents.len(), 2);
    assert_eq!(from_first.documents[0].name, "v2");
    assert!(from_first.documents[1].deleted);
    assert_eq!(from_first.checkpoint, first.checkpoint().unwrap());

    // A server that never pushed anything answers the same.
    let fresh = first.reopen();
    let body = fresh.handle_event(&stream_event()).unwrap();
    let bulk: PullBulk = serde_json::from_value(body).unwrap();
    assert_eq!(bulk, from_first);
}

#[test]
fn stream_reports_stored_documents() {
    let server = TestServer::memory();
    let receiver = server.subscribe();

    server.push_ok(vec![insert_row("1", "a")]);
    server.push_ok(vec![PushRow::new(todo_input("1", "a", false).with_deleted(true))]);

    let body = server.handle_event(&stream_event()).unwrap();
    assert_eq!(body["documents"][0]["id"], "1");
    assert_eq!(body["documents"][0]["deleted"], true);

    let published: Vec<PullBulk> = receiver.try_iter().collect();
    assert_eq!(published.len(), 2);
    assert_eq!(published[1].checkpoint, server.checkpoint().unwrap());
}

#[test]
fn envelope_accepts_top_level_arguments() {
    let server = TestServer::memory();
    let body = server
        .handle_event(&json!({
            "operationName": "pushTodo",
            "rows": [{"newDocumentState": {
                "id": "9", "name": "top level", "done": false,
                "timestamp": "2024-11-25T10:00:00"
            }}]
        }))
        .unwrap();
    assert_eq!(body["changeAction"], json!(["inserted"]));

    let body = server
        .handle_event(&json!({"operation": "pullTodo", "checkpoint": null}))
        .unwrap();
    assert_eq!(body["documents"][0]["id"], "9");
}

#[test]
fn oversized_push_is_rejected() {
    let server = TestServer::memory_with(ServerConfig::default().with_max_push_batch(2));
    let rows: Vec<_> = (1..=3).map(|i| insert_row(&i.to_string(), "x")).collect();

    let err = server.handle_event(&push_event(&rows)).unwrap_err();
    assert!(err.is_client_error());
    assert!(server.store().records().is_empty());
}

#[test]
fn file_store_is_shared_between_servers() {
    let first = TestServer::file();
    let second = first.reopen();

    first.push_ok(vec![insert_row("1", "from first")]);
    let bulk = second.pull(None).unwrap();
    assert_eq!(bulk.documents.len(), 1);
    assert_eq!(bulk.checkpoint, first.checkpoint().unwrap());

    second
        .push(vec![PushRow::assuming(
            todo_input("1", "from first", false),
            todo_input("1", "from second", true),
        )])
        .unwrap();

    let conn = first.store().connect().unwrap();
    assert_eq!(conn.count().unwrap(), 1);
    drop(conn);

    let (documents, checkpoint) = first.pull_all(None);
    assert_eq!(documents[0].name, "from second");
    assert_eq!(checkpoint, second.checkpoint().unwrap());
}
