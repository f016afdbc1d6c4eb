//! # Containment Engine
//!
//! Maintains the path-derived parent/child graph and LDP membership.
//!
//! Every resource except the root has a parent at the path-wise parent UID.
//! Missing intermediate parents are created as basic containers, one level
//! at a time, so the walk always terminates at the root. Direct and
//! indirect containers additionally assert a membership triple on their
//! membership resource for each new child.

use crate::context::Context;
use crate::factory::ResourceFactory;
use crate::imr::TripleSet;
use crate::primitives::ROOT_UID;
use crate::resource::Resource;
use crate::types::{EventKind, Handling, LdpError, LdpVariant};
use crate::uid::parent_uid;
use crate::vocab::{fcrepo, ldp};
use oxigraph::model::{NamedNode, Term, Triple};
use tracing::{debug, info};

impl Resource {
    /// Link the resource to its parent, creating missing ancestors.
    ///
    /// On `create` the parent gains `ldp:contains` and, for direct/indirect
    /// containers, the membership resource gains a membership triple.
    /// Returns the triples to add to this resource (`fcrepo:hasParent`).
    pub(crate) fn containment_rel(
        &mut self,
        ctx: &mut Context<'_>,
        create: bool,
    ) -> Result<TripleSet, LdpError> {
        let Some(parent_uid) = parent_uid(self.uid()) else {
            return Ok(TripleSet::new());
        };

        let parent = match ResourceFactory::from_stored(ctx, &parent_uid, None, true) {
            Ok(parent) => parent,
            Err(LdpError::ResourceNotExists(_)) if parent_uid != ROOT_UID => {
                info!(uid = %parent_uid, "creating intermediate container");
                let mut synthetic = ResourceFactory::new_container(ctx, &parent_uid)?;
                synthetic.create_or_replace(ctx, false)?;
                ResourceFactory::from_stored(ctx, &parent_uid, None, true)?
            }
            Err(e) => return Err(e),
        };
        let mut parent = parent.without_children().with_handling(Handling::None);

        if create {
            let mut contains = TripleSet::new();
            contains.insert(Triple::new(
                parent.uri().clone(),
                ldp::CONTAINS.into_owned(),
                self.uri().clone(),
            ));
            parent.modify(ctx, Some(EventKind::Updated), &TripleSet::new(), &contains)?;
        }

        let mut add = TripleSet::new();
        add.insert(Triple::new(
            self.uri().clone(),
            fcrepo::HAS_PARENT.into_owned(),
            parent.uri().clone(),
        ));

        if create && parent.variant().propagates_membership() {
            self.add_ldp_dc_ic_rel(ctx, &mut parent)?;
        }
        Ok(add)
    }

    /// Assert `(membershipResource, hasMemberRelation, member)` for this
    /// resource as a new child of `cont`.
    ///
    /// Direct containers use the child URI as member. Indirect containers
    /// take the value of `ldp:insertedContentRelation` from the child payload
    /// and skip the membership triple when the payload has none.
    fn add_ldp_dc_ic_rel(
        &mut self,
        ctx: &mut Context<'_>,
        cont: &mut Resource,
    ) -> Result<(), LdpError> {
        let meta = cont.metadata(ctx)?.clone();
        let s = meta
            .iri_value(ldp::MEMBERSHIP_RESOURCE)
            .unwrap_or_else(|| cont.uri().clone());
        let p = meta
            .iri_value(ldp::HAS_MEMBER_RELATION)
            .unwrap_or_else(|| ldp::MEMBER.into_owned());

        let o: Term = if cont.variant() == LdpVariant::IndirectContainer {
            let rel = meta
                .iri_value(ldp::INSERTED_CONTENT_RELATION)
                .unwrap_or_else(|| ldp::MEMBER_SUBJECT.into_owned());
            match self.provided().and_then(|p| p.value(rel.as_ref())).cloned() {
                Some(o) => o,
                None => {
                    debug!(
                        uid = %self.uid(),
                        relation = %rel.as_str(),
                        "child has no inserted content relation; no membership triple"
                    );
                    return Ok(());
                }
            }
        } else {
            self.uri().clone().into()
        };

        self.assert_membership(ctx, s, p, o)
    }

    fn assert_membership(
        &self,
        ctx: &mut Context<'_>,
        s: NamedNode,
        p: NamedNode,
        o: Term,
    ) -> Result<(), LdpError> {
        let target_uid = ctx.store.uri_to_uid(s.as_ref())?;
        let mut target = ResourceFactory::from_stored(ctx, &target_uid, None, true)?
            .without_children()
            .with_handling(Handling::None);
        info!(
            target = %target_uid,
            relation = %p.as_str(),
            member = %o,
            "adding membership triple"
        );
        let mut add = TripleSet::new();
        add.insert(Triple::new(s, p, o));
        target.modify(ctx, Some(EventKind::Updated), &TripleSet::new(), &add)
    }
}
