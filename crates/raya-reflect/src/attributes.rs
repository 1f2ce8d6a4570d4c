//! Attribute lookup and caching
//!
//! Outcomes are cached per `(target, attribute type, include_inherited)`,
//! absent results included, so repeated negative lookups cost one map probe.

use std::any::{Any, TypeId};
use std::convert::Infallible;
use std::sync::Arc;

use raya_meta::{Attribute, AttributeSet, TypeDef};
use tracing::trace;

use crate::cache::{get_or_add, CacheCounters, CacheStats, FxDashMap};
use crate::descriptor::{MemberDescriptor, MemberId, MemberKind};

/// Something attributes can be attached to
#[derive(Debug, Clone, Copy)]
pub enum AttributeTarget<'a> {
    /// A type; inherited lookups walk the ancestor chain
    Type(&'a Arc<TypeDef>),
    /// A member; inherited lookups walk the overridden-member chain
    Member(&'a MemberDescriptor),
}

impl<'a> From<&'a Arc<TypeDef>> for AttributeTarget<'a> {
    fn from(ty: &'a Arc<TypeDef>) -> Self {
        AttributeTarget::Type(ty)
    }
}

impl<'a> From<&'a MemberDescriptor> for AttributeTarget<'a> {
    fn from(member: &'a MemberDescriptor) -> Self {
        AttributeTarget::Member(member)
    }
}

impl<'a> From<&'a Arc<MemberDescriptor>> for AttributeTarget<'a> {
    fn from(member: &'a Arc<MemberDescriptor>) -> Self {
        AttributeTarget::Member(member)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TargetKey {
    Type(raya_meta::ClassId),
    Member(MemberId),
}

type AttributeKey = (TargetKey, TypeId, bool);
type CachedAttribute = Option<Arc<dyn Any + Send + Sync>>;

/// Cached attribute resolution
#[derive(Default)]
pub struct AttributeCache {
    entries: FxDashMap<AttributeKey, CachedAttribute>,
    counters: CacheCounters,
}

impl AttributeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The attribute of type `A` on `target`, or `None` when absent
    pub fn get<A: Attribute>(
        &self,
        target: AttributeTarget<'_>,
        include_inherited: bool,
    ) -> Option<Arc<A>> {
        let type_id = TypeId::of::<A>();
        let target_key = match target {
            AttributeTarget::Type(ty) => TargetKey::Type(ty.id()),
            AttributeTarget::Member(member) => TargetKey::Member(member.id()),
        };
        let key = (target_key, type_id, include_inherited);
        let Ok(found) = get_or_add::<_, _, Infallible>(&self.entries, &self.counters, key, || {
            trace!(?target_key, attribute = std::any::type_name::<A>(), "attribute cache miss");
            Ok(resolve(target, type_id, include_inherited))
        });
        found.and_then(|attr| attr.downcast::<A>().ok())
    }

    /// Whether `target` carries an attribute of type `A`
    pub fn has<A: Attribute>(&self, target: AttributeTarget<'_>, include_inherited: bool) -> bool {
        self.get::<A>(target, include_inherited).is_some()
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len())
    }

    /// Drop every cached outcome
    pub fn reset(&self) {
        self.entries.clear();
        self.counters.reset();
    }
}

fn resolve(target: AttributeTarget<'_>, type_id: TypeId, include_inherited: bool) -> CachedAttribute {
    match target {
        AttributeTarget::Type(ty) => {
            if let Some(found) = ty.attributes().find_raw(type_id, false) {
                return Some(found);
            }
            if !include_inherited {
                return None;
            }
            ty.ancestors()
                .skip(1)
                .find_map(|ancestor| ancestor.attributes().find_raw(type_id, true))
        }
        AttributeTarget::Member(member) => {
            if let Some(found) = member.attributes().find_raw(type_id, false) {
                return Some(found);
            }
            if !include_inherited {
                return None;
            }
            overridden_chain(member)
                .into_iter()
                .find_map(|attrs| attrs.find_raw(type_id, true))
        }
    }
}

/// Attribute sets of the members `member` overrides, nearest first.
/// Fields and constructors never override anything.
fn overridden_chain(member: &MemberDescriptor) -> Vec<&AttributeSet> {
    let mut chain = Vec::new();
    match member.kind() {
        MemberKind::Method => {
            let Some(mut current) = member.method_def() else {
                return chain;
            };
            let mut level = member.declaring_type().parent().map(|p| &**p);
            while current.is_override {
                let Some(found) = level.and_then(|ty| {
                    ty.ancestors().find_map(|ancestor| {
                        ancestor
                            .methods()
                            .iter()
                            .find(|m| {
                                !m.is_static && m.name == current.name && m.params == current.params
                            })
                            .map(|m| (ancestor, m))
                    })
                }) else {
                    break;
                };
                chain.push(&found.1.attributes);
                current = found.1;
                level = found.0.parent().map(|p| &**p);
            }
        }
        MemberKind::Property => {
            let Some(mut current) = member.property_def() else {
                return chain;
            };
            let mut level = member.declaring_type().parent().map(|p| &**p);
            while current.is_override {
                let Some(found) = level.and_then(|ty| {
                    ty.ancestors().find_map(|ancestor| {
                        ancestor
                            .properties()
                            .iter()
                            .find(|p| !p.is_static && p.name == current.name && p.ty == current.ty)
                            .map(|p| (ancestor, p))
                    })
                }) else {
                    break;
                };
                chain.push(&found.1.attributes);
                current = found.1;
                level = found.0.parent().map(|p| &**p);
            }
        }
        MemberKind::Field | MemberKind::Constructor => {}
    }
    chain
}
