//! Router and history behaviour across backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use page_router::config::{HistoryConfig, HistoryMode};
use page_router::history::{
    create_history, Action, BrowserHistory, History, InMemoryPlatform, MemoryHistory, Navigation,
    PartialPath, Platform, Transition, Verdict,
};
use page_router::routing::{ParamValue, Phase, Router};
use page_router::RouteNode;
use serde_json::{json, Value};

mod common;

fn site() -> Vec<RouteNode> {
    vec![
        RouteNode::page("/about"),
        RouteNode::page("/"),
        RouteNode::layout(
            "/blog",
            vec![RouteNode::page("/blog"), RouteNode::page("/blog/:slug")],
        ),
        RouteNode::page("/:id"),
    ]
}

fn browser() -> (Arc<InMemoryPlatform>, Router) {
    let platform = Arc::new(InMemoryPlatform::parse("http://localhost/").unwrap());
    let history = Arc::new(BrowserHistory::new(platform.clone()));
    (platform, Router::new(history, site()))
}

#[test]
fn test_memory_double_push_is_not_deduplicated() {
    let history = Arc::new(MemoryHistory::default());
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    let _unlisten = history.listen(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    history.push("/a".into(), Value::Null);
    history.push("/a".into(), Value::Null);

    let entries = history.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].pathname, "/a");
    assert_eq!(entries[2].pathname, "/a");
    assert_ne!(entries[1].key, entries[2].key);
    assert_eq!(notified.load(Ordering::SeqCst), 2);
}

#[test]
fn test_browser_resolve_href() {
    let (_, router) = browser();
    let resolved = router.resolve(
        PartialPath::pathname("/the/path")
            .with_search("?the=query")
            .with_hash("#the-hash"),
        None,
    );
    assert_eq!(resolved.href, "/the/path?the=query#the-hash");
}

#[test]
fn test_resolve_then_create_href_round_trips() {
    let (_, router) = browser();
    for href in ["/blog/hello", "/a/b?x=1", "/a#frag", "/a?x=1#frag"] {
        let resolved = router.resolve(href, None);
        assert_eq!(router.history().create_href(&resolved.path), href);
    }
}

#[test]
fn test_encoded_hash_is_a_different_location() {
    let (_, router) = browser();
    let encoded = router.resolve("/%23abc", None).path;
    let fragment = router.resolve("/#abc", None).path;

    assert_eq!(encoded.pathname, "/%23abc");
    assert_eq!(encoded.hash, "");
    assert_eq!(fragment.pathname, "/");
    assert_eq!(fragment.hash, "#abc");
    assert_ne!(encoded, fragment);
}

#[test]
fn test_push_matches_and_writes_through_to_platform() {
    let (platform, router) = browser();
    assert_eq!(router.push("/blog/hello?draft=1", json!({"from": "test"})), Navigation::Committed);

    let current = router.current();
    assert_eq!(current.action, Action::Push);
    assert_eq!(current.params["slug"], ParamValue::from("hello"));
    assert_eq!(current.location.state, json!({"from": "test"}));
    assert_eq!(platform.url().path(), "/blog/hello");
    assert_eq!(platform.url().query(), Some("draft=1"));
}

#[test]
fn test_blocker_without_retry_keeps_location() {
    let history = Arc::new(MemoryHistory::new(["/"], None));
    let router = Router::new(history.clone(), site());
    let _unblock = router.block(|_| Verdict::Hold);

    for target in ["/about", "/blog", "/42"] {
        assert_eq!(router.push(target, Value::Null), Navigation::Blocked);
    }
    router.go(-1);

    assert_eq!(router.current().location.pathname, "/");
    assert_eq!(history.entries().len(), 1);
    assert_eq!(router.phase(), Phase::Blocked);
}

#[test]
fn test_retry_commits_the_held_transition_once() {
    let history = Arc::new(MemoryHistory::new(["/"], None));
    let router = Router::new(history.clone(), site());

    let held: Arc<Mutex<Vec<Transition>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = held.clone();
    let _unblock = router.block(move |tx| {
        sink.lock().unwrap().push(tx.clone());
        Verdict::Hold
    });

    let commits = Arc::new(AtomicUsize::new(0));
    let counter = commits.clone();
    let _after = router.after_each(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    router.push("/about", Value::Null);
    let tx = held.lock().unwrap().pop().unwrap();
    assert!(tx.retry());
    assert!(!tx.retry());

    assert_eq!(router.current().location.pathname, "/about");
    assert_eq!(history.entries().len(), 2);
    assert_eq!(commits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_newer_navigation_supersedes_held_one() {
    let history = Arc::new(MemoryHistory::new(["/"], None));
    let router = Router::new(history, site());

    let held: Arc<Mutex<Vec<Transition>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = held.clone();
    let unblock = router.block(move |tx| {
        sink.lock().unwrap().push(tx.clone());
        Verdict::Hold
    });

    router.push("/about", Value::Null);
    router.push("/blog", Value::Null);
    unblock.unsubscribe();

    let transitions = held.lock().unwrap().clone();
    assert!(!transitions[0].retry());
    assert!(transitions[1].retry());
    assert_eq!(router.current().location.pathname, "/blog");
}

#[test]
fn test_go_out_of_range_is_a_no_op() {
    let history = Arc::new(MemoryHistory::new(["/a", "/b", "/c"], Some(1)));
    let router = Router::new(history.clone(), site());

    router.go(5);
    router.go(-5);
    assert_eq!(router.current().location.pathname, "/b");
    assert_eq!(history.index(), 1);

    let (platform, router) = browser();
    router.push("/about", Value::Null);
    router.go(3);
    router.go(-3);
    assert_eq!(router.current().location.pathname, "/about");
    assert_eq!(platform.index(), 1);
}

#[test]
fn test_vetoed_external_back_is_reverted() {
    let (platform, router) = browser();
    router.push("/about", Value::Null);

    let held: Arc<Mutex<Option<Transition>>> = Arc::new(Mutex::new(None));
    let sink = held.clone();
    let unblock = router.block(move |tx| {
        *sink.lock().unwrap() = Some(tx.clone());
        Verdict::Hold
    });

    // Back button pressed outside the router.
    assert_eq!(router.phase(), Phase::Idle);
    platform.go(-1);
    assert_eq!(platform.url().path(), "/about");
    assert_eq!(router.current().location.pathname, "/about");
    assert_eq!(router.phase(), Phase::Blocked);

    unblock.unsubscribe();
    let tx = held.lock().unwrap().take().unwrap();
    assert_eq!(tx.action, Action::Pop);
    assert!(tx.retry());
    assert_eq!(platform.url().path(), "/");
    assert_eq!(router.current().location.pathname, "/");
    assert_eq!(router.current().action, Action::Pop);
    assert_eq!(router.phase(), Phase::Idle);
}

#[test]
fn test_go_with_extreme_delta_is_a_no_op() {
    let history = Arc::new(MemoryHistory::new(["/a", "/b"], None));
    let router = Router::new(history.clone(), site());
    router.go(isize::MAX);
    router.go(isize::MIN);
    assert_eq!(router.current().location.pathname, "/b");
    assert_eq!(history.index(), 1);

    let (platform, router) = browser();
    router.push("/about", Value::Null);
    router.go(isize::MAX);
    router.go(isize::MIN);
    assert_eq!(router.current().location.pathname, "/about");
    assert_eq!(platform.index(), 1);
    assert_eq!(router.phase(), Phase::Idle);
}

#[test]
fn test_unmatched_navigation_reaches_after_each() {
    let history = create_history(&HistoryConfig {
        mode: HistoryMode::Memory,
        ..HistoryConfig::default()
    })
    .unwrap();
    let router = Router::new(history, vec![RouteNode::page("/")]);

    let misses = Arc::new(Mutex::new(Vec::new()));
    let sink = misses.clone();
    let _after = router.after_each(move |route| {
        if !route.is_matched() {
            sink.lock().unwrap().push(route.location.pathname.clone());
        }
    });

    router.push("/missing", Value::Null);
    router.push("/", Value::Null);
    assert_eq!(*misses.lock().unwrap(), vec!["/missing".to_string()]);
}

#[test]
fn test_replace_routes_from_discovery() {
    let dir = common::pages_dir(common::SITE);
    let history = Arc::new(MemoryHistory::new(["/blog/hello"], None));
    let router = Router::new(history, Vec::new());
    assert!(!router.current().is_matched());

    let routes = page_router::discovery::discover(&common::discovery_config(dir.path())).unwrap();
    router.replace_routes(routes);

    let current = router.current();
    assert_eq!(current.matches.len(), 2);
    assert_eq!(current.params["slug"], ParamValue::from("hello"));
    assert_eq!(router.routes().len(), 4);
}
