//! # Containment Tests
//!
//! Direct and indirect container membership propagation.

mod common;

use common::{EX, has_triple, iri, repo, titled, ttl, uri};
use ldpstore_core::vocab::ldp;
use ldpstore_core::{EventKind, ImrOptions, LdpVariant};

#[test]
fn direct_container_defaults_to_itself_and_ldp_member() {
    let mut repo = repo();
    repo.create_or_replace("/dc", ttl("<> a ldp:DirectContainer ."))
        .expect("create container");
    assert_eq!(repo.variant("/dc").expect("variant"), LdpVariant::DirectContainer);

    repo.create_or_replace("/dc/child", titled("c")).expect("create child");
    let dc = repo.get("/dc", ImrOptions::default(), true).expect("get");
    assert!(has_triple(
        dc.triples(),
        &uri("/dc"),
        &ldp::MEMBER.into_owned(),
        &uri("/dc/child").into()
    ));
}

#[test]
fn direct_container_writes_to_third_resource() {
    let mut repo = repo();
    repo.create_or_replace("/members", titled("members")).expect("create");
    repo.create_or_replace(
        "/dc",
        ttl("<> a ldp:DirectContainer ;\n  ldp:membershipResource <info:fcres/members> ;\n  ldp:hasMemberRelation ex:hasMember ."),
    )
    .expect("create container");

    let before = repo.changelog().len();
    repo.create_or_replace("/dc/child", titled("c")).expect("create child");

    let members = repo.get("/members", ImrOptions::default(), false).expect("get");
    assert!(has_triple(
        members.triples(),
        &uri("/members"),
        &iri(&format!("{EX}hasMember")),
        &uri("/dc/child").into()
    ));
    let dc = repo.get("/dc", ImrOptions::default(), false).expect("get");
    assert!(!dc.iter().any(|t| t.predicate.as_str() == format!("{EX}hasMember")));

    let updated: Vec<&str> = repo
        .changelog()
        .iter()
        .skip(before)
        .filter(|e| e.kind == EventKind::Updated)
        .map(|e| e.uid.as_str())
        .collect();
    assert!(updated.contains(&"/members"));
    assert!(updated.contains(&"/dc"));
}

#[test]
fn replacing_a_member_does_not_duplicate_membership() {
    let mut repo = repo();
    repo.create_or_replace("/dc", ttl("<> a ldp:DirectContainer .")).expect("create");
    repo.create_or_replace("/dc/child", titled("c")).expect("create child");
    let before = repo.changelog().len();
    repo.create_or_replace("/dc/child", titled("d")).expect("replace child");
    assert!(repo.changelog().iter().skip(before).all(|e| e.uid == "/dc/child"));
}

#[test]
fn indirect_container_reads_child_payload() {
    let mut repo = repo();
    repo.create_or_replace("/members", titled("members")).expect("create");
    repo.create_or_replace(
        "/ic",
        ttl("<> a ldp:IndirectContainer ;\n  ldp:membershipResource <info:fcres/members> ;\n  ldp:hasMemberRelation ex:hasMember ;\n  ldp:insertedContentRelation ex:proxyFor ."),
    )
    .expect("create container");
    assert_eq!(repo.variant("/ic").expect("variant"), LdpVariant::IndirectContainer);

    repo.create_or_replace("/ic/p1", ttl("<> ex:proxyFor <http://example.org/target> ."))
        .expect("create proxy");
    let members = repo.get("/members", ImrOptions::default(), false).expect("get");
    assert!(has_triple(
        members.triples(),
        &uri("/members"),
        &iri(&format!("{EX}hasMember")),
        &iri("http://example.org/target").into()
    ));
}

#[test]
fn indirect_container_skips_child_without_relation() {
    let mut repo = repo();
    repo.create_or_replace(
        "/ic",
        ttl("<> a ldp:IndirectContainer ;\n  ldp:insertedContentRelation ex:proxyFor ."),
    )
    .expect("create container");

    repo.create_or_replace("/ic/p2", titled("no proxy")).expect("create child");
    let ic = repo.get("/ic", ImrOptions::default(), true).expect("get");
    assert!(ic.value(ldp::MEMBER).is_none());
    assert!(has_triple(
        ic.triples(),
        &uri("/ic"),
        &ldp::CONTAINS.into_owned(),
        &uri("/ic/p2").into()
    ));
}

#[test]
fn container_type_is_kept_on_replace() {
    let mut repo = repo();
    repo.create_or_replace("/dc", ttl("<> a ldp:DirectContainer .")).expect("create");
    repo.create_or_replace("/dc", titled("renamed")).expect("replace");
    assert_eq!(repo.variant("/dc").expect("variant"), LdpVariant::DirectContainer);
}

#[test]
fn synthesized_ancestors_are_contained_one_level_at_a_time() {
    let mut repo = repo();
    repo.create_or_replace("/a/b/c/d", titled("leaf")).expect("create");
    let root = repo.get("/", ImrOptions::default(), true).expect("root");
    let contained: Vec<_> = root.objects(ldp::CONTAINS);
    assert_eq!(contained.len(), 1);
    for (parent, child) in [("/a", "/a/b"), ("/a/b", "/a/b/c"), ("/a/b/c", "/a/b/c/d")] {
        let graph = repo.get(parent, ImrOptions::default(), true).expect("get");
        assert!(has_triple(
            graph.triples(),
            &uri(parent),
            &ldp::CONTAINS.into_owned(),
            &uri(child).into()
        ));
    }
}
