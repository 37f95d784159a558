use std::time::Duration;

use pr_dashboard::engine::{Engine, Event, FailureKind, FetchFailure, Request, StubEngine};
use pr_dashboard::types::{PullRequest, SignedInSession, SignedInUser, Status};

const STUB_PRS: &str = r#"[
  {
    "author": { "login": "alice", "avatarUrl": "", "orgLogins": ["MetaMask"] },
    "authorCategories": ["myTeam"],
    "number": 101,
    "title": "Add swaps :sparkles:",
    "url": "https://github.com/MetaMask/metamask-extension/pull/101",
    "createdAt": "2024-05-01T10:00:00Z",
    "isDraft": false,
    "labelNames": ["team-swaps"],
    "priorityLevel": 2,
    "statuses": ["needsReview"],
    "isCreatedByMetaMaskian": true
  },
  {
    "author": { "login": "bob", "avatarUrl": "", "orgLogins": [] },
    "authorCategories": ["contributors"],
    "number": 102,
    "title": "WIP: draft",
    "url": "https://github.com/MetaMask/metamask-extension/pull/102",
    "createdAt": "2024-05-02T10:00:00Z",
    "isDraft": true,
    "labelNames": [],
    "priorityLevel": 0,
    "statuses": ["isReadyToMerge"],
    "isCreatedByMetaMaskian": false
  }
]"#;

fn load_fixture_prs() -> Vec<PullRequest> {
    serde_json::from_str(STUB_PRS).expect("valid stub pull requests fixture")
}

fn session() -> SignedInSession {
    SignedInSession {
        access_token: "token".to_owned(),
        user: SignedInUser {
            login: "carol".to_owned(),
            org_logins: vec!["MetaMask".to_owned()],
        },
    }
}

#[test]
fn stub_engine_fetch_returns_fixture_data_without_drafts() {
    let prs = load_fixture_prs();
    assert_eq!(prs.len(), 2, "fixture should have two pull requests");

    let handle = StubEngine {
        prs,
        failure: None,
    }
    .start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::FetchPullRequests {
        generation: 7,
        session: session(),
        refresh: false,
        reply_tx: tx,
    });

    let event = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("engine should reply within 2 seconds");

    match event {
        Event::PullRequestsFetched {
            generation,
            pull_requests,
        } => {
            assert_eq!(generation, 7);
            assert_eq!(pull_requests.len(), 1);
            assert_eq!(pull_requests[0].number, 101);
            assert_eq!(pull_requests[0].statuses, vec![Status::NeedsReview]);
        }
        other @ Event::FetchFailed { .. } => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn stub_engine_relays_configured_failure() {
    let failure = FetchFailure {
        kind: FailureKind::Unauthorized,
        message: "Bad credentials".to_owned(),
    };
    let handle = StubEngine {
        prs: load_fixture_prs(),
        failure: Some(failure.clone()),
    }
    .start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::FetchPullRequests {
        generation: 1,
        session: session(),
        refresh: true,
        reply_tx: tx,
    });

    let event = rx
        .recv_timeout(Duration::from_secs(2))
        .expect("engine should reply within 2 seconds");
    assert_eq!(event.generation(), 1);
    match event {
        Event::FetchFailed { failure: got, .. } => assert_eq!(got, failure),
        other @ Event::PullRequestsFetched { .. } => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn stub_engine_stops_on_shutdown() {
    let handle = StubEngine::default().start();
    handle.send(Request::Shutdown);

    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    handle.send(Request::FetchPullRequests {
        generation: 2,
        session: session(),
        refresh: false,
        reply_tx: tx,
    });
    // The reply sender is dropped unanswered once the loop has exited.
    assert!(rx.recv_timeout(Duration::from_secs(2)).is_err());
}
