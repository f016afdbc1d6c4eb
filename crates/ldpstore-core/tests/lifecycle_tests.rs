//! # Lifecycle Tests
//!
//! Create, replace, bury, resurrect and forget through the repository
//! entry points, with the in-memory store.

#![allow(clippy::panic)]

mod common;

use common::{DC_TITLE, has_triple, iri, repo, repo_with, title_of, titled, ttl, uri};
use ldpstore_core::vocab::{fcrepo, fcsystem, ldp};
use ldpstore_core::{
    EventKind, ImrOptions, LdpError, LdpVariant, Payload, RepoConfig, ResourceStore,
};

// =============================================================================
// BOOTSTRAP
// =============================================================================

#[test]
fn open_bootstraps_root_container() {
    let mut repo = repo();
    assert!(repo.exists("/").expect("exists"));
    assert_eq!(repo.variant("/").expect("variant"), LdpVariant::BasicContainer);
    let meta = repo.get_metadata("/").expect("metadata");
    assert!(meta.has_type(fcrepo::REPOSITORY_ROOT));
    assert!(meta.has_type(ldp::BASIC_CONTAINER));
}

#[test]
fn reopening_keeps_existing_root() {
    let repo = repo();
    let (store, binaries) = repo.into_parts();
    let before = store.load("/").expect("load");
    let repo = ldpstore_core::Repository::open(store, binaries, RepoConfig::default())
        .expect("reopen");
    assert_eq!(repo.store().load("/").expect("load"), before);
}

// =============================================================================
// CREATE / REPLACE
// =============================================================================

#[test]
fn create_stamps_server_managed_triples() {
    let mut repo = repo();
    let ev = repo.create_or_replace("/a", titled("A")).expect("create");
    assert_eq!(ev, EventKind::Created);

    let meta = repo.get_metadata("/a").expect("metadata");
    for rdf_type in [ldp::RESOURCE, ldp::RDF_SOURCE, ldp::CONTAINER, ldp::BASIC_CONTAINER, fcrepo::RESOURCE] {
        assert!(meta.has_type(rdf_type), "missing type {rdf_type}");
    }
    assert!(meta.value(fcrepo::CREATED).is_some());
    assert!(meta.value(fcrepo::CREATED_BY).is_some());
    assert!(meta.value(fcrepo::LAST_MODIFIED).is_some());
    assert_eq!(meta.iri_value(fcrepo::HAS_PARENT), Some(uri("/")));

    let graph = repo.get("/a", ImrOptions::default(), false).expect("get");
    assert_eq!(title_of(&graph).as_deref(), Some("A"));
    assert!(graph.value(fcrepo::CREATED).is_none());
}

#[test]
fn parent_gains_containment_on_create_only() {
    let mut repo = repo();
    repo.create_or_replace("/a", titled("A")).expect("create");
    let root = repo.get("/", ImrOptions::default(), true).expect("get root");
    assert!(has_triple(root.triples(), &uri("/"), &ldp::CONTAINS.into_owned(), &uri("/a").into()));

    let before = repo.changelog().len();
    repo.create_or_replace("/a", titled("B")).expect("replace");
    let root_events = repo
        .changelog()
        .iter()
        .skip(before)
        .filter(|e| e.uid == "/")
        .count();
    assert_eq!(root_events, 0);
}

#[test]
fn replace_swaps_user_data_and_keeps_creation() {
    let mut repo = repo();
    repo.create_or_replace("/a", titled("A")).expect("create");
    let created = repo.get_metadata("/a").expect("metadata").value(fcrepo::CREATED).cloned();

    let ev = repo.create_or_replace("/a", titled("B")).expect("replace");
    assert_eq!(ev, EventKind::Updated);

    let graph = repo.get("/a", ImrOptions::default(), true).expect("get");
    assert_eq!(title_of(&graph).as_deref(), Some("B"));
    assert_eq!(graph.objects(iri(DC_TITLE).as_ref()).len(), 1);
    assert_eq!(graph.value(fcrepo::CREATED).cloned(), created);
}

#[test]
fn replace_with_same_payload_is_idempotent() {
    let mut repo = repo();
    repo.create_or_replace("/a", titled("A")).expect("create");
    repo.create_or_replace("/a", titled("A")).expect("replace");
    let first = repo.get("/a", ImrOptions::default(), false).expect("get");
    repo.create_or_replace("/a", titled("A")).expect("replace again");
    let second = repo.get("/a", ImrOptions::default(), false).expect("get");
    assert_eq!(first, second);
}

#[test]
fn create_mints_uid_from_slug() {
    let mut repo = repo();
    let uid = repo.create("/", Some("foo"), titled("x")).expect("create");
    assert_eq!(uid, "/foo");

    let taken = repo.create("/", Some("foo"), titled("y")).expect("create");
    assert_ne!(taken, "/foo");
    assert!(taken.starts_with('/'));

    let random = repo.create("/", None, titled("z")).expect("create");
    assert!(repo.exists(&random).expect("exists"));
}

#[test]
fn slug_with_leading_slash_is_rejected() {
    let mut repo = repo();
    let err = repo.create("/", Some("/abs"), titled("x")).expect_err("must fail");
    assert!(matches!(err, LdpError::InvalidResource { .. }));
}

#[test]
fn create_under_binary_is_rejected() {
    let mut repo = repo();
    repo.create_or_replace("/bin", Payload::binary(b"data".to_vec(), None))
        .expect("create binary");
    let err = repo.create("/bin", Some("x"), titled("x")).expect_err("must fail");
    assert!(matches!(err, LdpError::InvalidResource { .. }));
}

#[test]
fn intermediate_containers_are_materialized() {
    let mut repo = repo();
    repo.create_or_replace("/x/y/z", titled("deep")).expect("create");
    for uid in ["/x", "/x/y", "/x/y/z"] {
        assert!(repo.exists(uid).expect("exists"), "{uid} missing");
    }
    assert_eq!(repo.variant("/x").expect("variant"), LdpVariant::BasicContainer);

    let x = repo.get("/x", ImrOptions::default(), true).expect("get");
    assert!(has_triple(x.triples(), &uri("/x"), &ldp::CONTAINS.into_owned(), &uri("/x/y").into()));
    let z = repo.get_metadata("/x/y/z").expect("metadata");
    assert_eq!(z.iri_value(fcrepo::HAS_PARENT), Some(uri("/x/y")));
}

#[test]
fn malformed_uid_is_rejected() {
    let mut repo = repo();
    for uid in ["a", "/a/", "/a//b", "/a/fcr:versions/x"] {
        let err = repo.create_or_replace(uid, titled("x")).expect_err("must fail");
        assert!(matches!(err, LdpError::InvalidResource { .. }), "{uid}: {err}");
    }
}

#[test]
fn malformed_turtle_is_a_parsing_error() {
    let mut repo = repo();
    let err = repo
        .create_or_replace("/a", Payload::rdf(b"<> <broken".to_vec(), "turtle"))
        .expect_err("must fail");
    assert!(matches!(err, LdpError::RdfParsing { .. }));
    assert!(!repo.exists("/a").expect("exists"));
}

// =============================================================================
// NON-RDF SOURCES
// =============================================================================

#[test]
fn binary_resource_is_described_and_stored() {
    let mut repo = repo();
    repo.create_or_replace("/bin", Payload::binary(b"hello".to_vec(), Some("text/plain")))
        .expect("create");
    assert_eq!(repo.variant("/bin").expect("variant"), LdpVariant::NonRdfSource);

    let headers = repo.head("/bin").expect("head");
    assert_eq!(headers["Content-Type"], vec!["text/plain".to_string()]);
    assert!(headers["ETag"][0].starts_with("W/\""));
    assert!(headers["Link"].iter().any(|l| l.contains("NonRDFSource")));
    assert_eq!(repo.get_binary("/bin").expect("binary").as_deref(), Some(&b"hello"[..]));
}

#[test]
fn replacing_binary_with_same_bytes_keeps_etag() {
    let mut repo = repo();
    repo.create_or_replace("/bin", Payload::binary(b"hello".to_vec(), Some("text/plain")))
        .expect("create");
    let etag = repo.head("/bin").expect("head")["ETag"].clone();

    let same = Payload::binary(b"hello".to_vec(), Some("text/plain"));
    assert_eq!(repo.create_or_replace("/bin", same).expect("replace"), EventKind::Updated);
    assert_eq!(repo.head("/bin").expect("head")["ETag"], etag);
}

#[test]
fn switching_rdf_and_binary_is_rejected() {
    let mut repo = repo();
    repo.create_or_replace("/bin", Payload::binary(b"x".to_vec(), None)).expect("create");
    let err = repo.create_or_replace("/bin", titled("x")).expect_err("must fail");
    assert!(matches!(err, LdpError::IncompatibleLdpType { mimetype: None, .. }));

    repo.create_or_replace("/rdf", titled("x")).expect("create");
    let err = repo
        .create_or_replace("/rdf", Payload::binary(b"x".to_vec(), Some("image/png")))
        .expect_err("must fail");
    assert!(matches!(err, LdpError::IncompatibleLdpType { mimetype: Some(_), .. }));
}

#[test]
fn mimetype_without_stream_is_invalid_payload() {
    let mut repo = repo();
    let err = repo
        .create_or_replace("/a", titled("x").with_mimetype("text/plain"))
        .expect_err("must fail");
    assert!(matches!(err, LdpError::InvalidPayload(_)));
}

// =============================================================================
// BURY / RESURRECT / FORGET
// =============================================================================

#[test]
fn bury_leaves_tombstones_on_subtree() {
    let mut repo = repo();
    repo.create_or_replace("/a/b/c", titled("c")).expect("create");
    assert_eq!(repo.delete("/a", true, false).expect("delete"), EventKind::Deleted);

    for uid in ["/a", "/a/b", "/a/b/c"] {
        assert!(!repo.exists(uid).expect("exists"), "{uid} still live");
    }
    match repo.get("/a", ImrOptions::default(), false) {
        Err(LdpError::Tombstone { uid, buried }) => {
            assert_eq!(uid, "/a");
            assert!(buried.is_some());
        }
        other => panic!("expected tombstone, got {other:?}"),
    }
    match repo.get("/a/b/c", ImrOptions::default(), false) {
        Err(LdpError::Tombstone { uid, .. }) => assert_eq!(uid, "/a"),
        other => panic!("expected pointer tombstone, got {other:?}"),
    }

    let pointer = fcsystem::TOMBSTONE.into_owned();
    let stored = repo.store().load("/a/b").expect("load").expect("graph");
    assert!(has_triple(&stored, &uri("/a/b"), &pointer, &uri("/a").into()));
    let stored = repo.store().load("/a/b/c").expect("load").expect("graph");
    assert!(has_triple(&stored, &uri("/a/b/c"), &pointer, &uri("/a/b").into()));
    assert!(!has_triple(&stored, &uri("/a/b/c"), &pointer, &uri("/a").into()));
}

#[test]
fn deep_pointer_chain_reports_buried_ancestor() {
    let mut repo = repo();
    repo.create_or_replace("/a/b/c/d", titled("d")).expect("create");
    repo.delete("/a/b", true, false).expect("delete");

    assert!(repo.exists("/a").expect("exists"));
    let stored = repo.store().load("/a/b/c/d").expect("load").expect("graph");
    assert!(has_triple(
        &stored,
        &uri("/a/b/c/d"),
        &fcsystem::TOMBSTONE.into_owned(),
        &uri("/a/b/c").into()
    ));
    match repo.resurrect("/a/b/c/d") {
        Err(LdpError::Tombstone { uid, buried }) => {
            assert_eq!(uid, "/a/b");
            assert!(buried.is_some());
        }
        other => panic!("expected ancestor tombstone, got {other:?}"),
    }

    repo.resurrect("/a/b").expect("resurrect");
    for uid in ["/a/b", "/a/b/c", "/a/b/c/d"] {
        assert!(repo.exists(uid).expect("exists"), "{uid} not back");
    }
    let stored = repo.store().load("/a/b/c/d").expect("load").expect("graph");
    assert!(stored.iter().all(|t| t.predicate.as_ref() != fcsystem::TOMBSTONE));
}

#[test]
fn tombstone_is_never_overwritten() {
    let mut repo = repo();
    repo.create_or_replace("/a", titled("A")).expect("create");
    repo.delete("/a", true, false).expect("delete");
    let err = repo.create_or_replace("/a", titled("again")).expect_err("must fail");
    assert!(matches!(err, LdpError::Tombstone { .. }));
    let err = repo.create_or_replace("/a/child", titled("x")).expect_err("must fail");
    assert!(matches!(err, LdpError::Tombstone { .. }));
}

#[test]
fn resurrect_restores_subtree() {
    let mut repo = repo();
    repo.create_or_replace("/a/b", titled("b")).expect("create");
    let types_before = repo.get_metadata("/a").expect("metadata").types();
    repo.delete("/a", true, false).expect("delete");

    let err = repo.resurrect("/a/b").expect_err("must fail");
    assert!(matches!(err, LdpError::Tombstone { ref uid, .. } if uid == "/a"));

    assert_eq!(repo.resurrect("/a").expect("resurrect"), uri("/a"));
    assert!(repo.exists("/a").expect("exists"));
    assert!(repo.exists("/a/b").expect("exists"));
    assert_eq!(repo.get_metadata("/a").expect("metadata").types(), types_before);
    assert_eq!(
        title_of(&repo.get("/a/b", ImrOptions::default(), false).expect("get")).as_deref(),
        Some("b")
    );
}

#[test]
fn resurrect_live_resource_is_invalid() {
    let mut repo = repo();
    repo.create_or_replace("/a", titled("A")).expect("create");
    let err = repo.resurrect("/a").expect_err("must fail");
    assert!(matches!(err, LdpError::InvalidResource { .. }));
}

#[test]
fn forget_purges_subtree_and_versions() {
    let mut repo = repo();
    repo.create_or_replace("/a/b", titled("b")).expect("create");
    repo.create_version("/a", Some("v1")).expect("version");
    repo.delete("/a", false, true).expect("forget");

    assert!(repo
        .store()
        .uids()
        .expect("uids")
        .iter()
        .all(|u| u == "/"));
    assert!(matches!(
        repo.get("/a", ImrOptions::default(), false),
        Err(LdpError::ResourceNotExists(_))
    ));
    let root = repo.get("/", ImrOptions::default(), true).expect("root");
    assert!(root.value(ldp::CONTAINS).is_none());
}

#[test]
fn forget_after_bury_leaves_nothing() {
    let mut repo = repo();
    repo.create_or_replace("/a/b", titled("b")).expect("create");
    repo.delete("/a", true, false).expect("bury");
    repo.forget("/a", true).expect("forget");
    assert!(repo.store().load("/a").expect("load").is_none());
    assert!(repo.store().load("/a/b").expect("load").is_none());
}

#[test]
fn root_cannot_be_deleted() {
    let mut repo = repo();
    assert!(matches!(repo.delete("/", true, false), Err(LdpError::InvalidResource { .. })));
    assert!(matches!(repo.delete("/", false, false), Err(LdpError::InvalidResource { .. })));
    assert!(repo.exists("/").expect("exists"));
}

#[test]
fn bury_with_inbound_versions_and_cuts_referrers() {
    let mut repo = repo();
    repo.create_or_replace("/target", titled("t")).expect("create");
    repo.create_or_replace("/ref", ttl("<> ex:about <info:fcres/target> .")).expect("create");

    repo.delete("/target", true, true).expect("delete");

    let referrer = repo.get("/ref", ImrOptions::default(), true).expect("get");
    assert!(!has_triple(
        referrer.triples(),
        &uri("/ref"),
        &iri("http://example.org/about"),
        &uri("/target").into()
    ));
    let labels = repo.version_uids("/ref").expect("versions");
    assert_eq!(labels.len(), 1);
    let label = labels.iter().next().expect("label");
    let snapshot = repo.get_version("/ref", label).expect("snapshot");
    assert!(snapshot
        .iter()
        .any(|t| t.predicate.as_str() == "http://example.org/about"));
}

// =============================================================================
// TRANSACTIONS + EVENTS
// =============================================================================

#[test]
fn committed_writes_emit_events_in_order() {
    let mut repo = repo();
    let before = repo.changelog().len();
    repo.create_or_replace("/a", titled("A")).expect("create");
    let events: Vec<_> = repo.changelog().iter().skip(before).collect();
    assert_eq!(events.len(), 2);
    assert_eq!((events[0].uid.as_str(), events[0].kind), ("/", EventKind::Updated));
    assert_eq!((events[1].uid.as_str(), events[1].kind), ("/a", EventKind::Created));
    assert!(events[1].resource_types.iter().any(|t| t == ldp::RESOURCE.as_str()));
    assert_eq!(events[1].actor.as_deref(), Some("BypassAdmin"));

    let mut queue = Vec::new();
    let delivered = repo.dispatch(&mut queue).expect("dispatch");
    assert_eq!(delivered, queue.len());
    assert!(repo.changelog().is_empty());
}

#[test]
fn delete_event_falls_back_to_delta_types() {
    let mut repo = repo();
    repo.create_or_replace("/a", titled("A")).expect("create");
    repo.delete("/a", true, false).expect("delete");
    let last = repo.changelog().iter().last().expect("event");
    assert_eq!(last.kind, EventKind::Deleted);
    assert!(last.resource_types.iter().any(|t| t == fcsystem::TOMBSTONE_TYPE.as_str()));
}

#[test]
fn messaging_off_records_nothing() {
    let mut repo = repo_with(RepoConfig::default().with_messaging(false));
    repo.create_or_replace("/a", titled("A")).expect("create");
    assert!(repo.changelog().is_empty());
}

#[test]
fn failed_request_rolls_back_store_and_events() {
    let mut repo = repo();
    repo.create_or_replace(
        "/dc",
        ttl("<> a ldp:DirectContainer ; ldp:membershipResource <info:fcres/nowhere> ."),
    )
    .expect("create container");
    let events_before = repo.changelog().len();
    let dc_before = repo.get("/dc", ImrOptions::default(), true).expect("get");

    let err = repo.create_or_replace("/dc/child", titled("c")).expect_err("must fail");
    assert!(matches!(err, LdpError::ResourceNotExists(ref uid) if uid == "/nowhere"));

    assert_eq!(repo.changelog().len(), events_before);
    assert!(!repo.exists("/dc/child").expect("exists"));
    assert_eq!(repo.get("/dc", ImrOptions::default(), true).expect("get"), dc_before);
}

#[test]
fn get_can_include_inbound_links() {
    let mut repo = repo();
    repo.create_or_replace("/target", titled("t")).expect("create");
    repo.create_or_replace("/ref", ttl("<> ex:about <info:fcres/target> .")).expect("create");
    let graph = repo
        .get("/target", ImrOptions::with_inbound(), false)
        .expect("get");
    assert!(has_triple(
        graph.triples(),
        &uri("/ref"),
        &iri("http://example.org/about"),
        &uri("/target").into()
    ));
}
