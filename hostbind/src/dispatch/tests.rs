//! Tests for overload resolution and the call-site cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::callsite::TypeTag;
use crate::convert::{Distance, DistanceOracle};
use crate::member::{MemberDescriptor, OverloadSet};
use crate::types::{ClassRef, HostType};

use super::cache::CallSiteCache;
use super::resolver::OverloadResolver;
use super::result::ResolutionError;
use super::signature::{CallSiteSignature, Dispatch};

fn owner() -> ClassRef {
    ClassRef::new("Host")
}

fn make_candidate(name: &str, params: Vec<HostType>, ret: HostType) -> MemberDescriptor {
    MemberDescriptor::method(&owner(), name, params, ret)
}

fn make_set(name: &str, members: Vec<MemberDescriptor>) -> OverloadSet {
    let members = members
        .into_iter()
        .enumerate()
        .map(|(i, m)| Arc::new(m.with_index(i)))
        .collect();
    OverloadSet::new(&owner(), name, members)
}

fn tag(ty: HostType) -> TypeTag {
    TypeTag::Type(ty)
}

fn resolve(set: &OverloadSet, tags: &[TypeTag]) -> Result<Arc<MemberDescriptor>, ResolutionError> {
    OverloadResolver::new().resolve(set, Dispatch::Instance, tags)
}

/// `Animal <- Dog`, plus an unrelated `Rock`.
fn zoo() -> (ClassRef, ClassRef, ClassRef) {
    let animal = ClassRef::new("Animal");
    let dog = ClassRef::with_supertypes("Dog", vec![animal.clone()]);
    let rock = ClassRef::new("Rock");
    (animal, dog, rock)
}

// ============================================================
// Resolution
// ============================================================

#[test]
fn test_exact_match_beats_widening_and_boxing() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Int], HostType::Void),
            make_candidate("f", vec![HostType::Long], HostType::Void),
            make_candidate("f", vec![HostType::Object], HostType::Void),
        ],
    );

    let winner = resolve(&set, &[tag(HostType::Int)]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::Int]);

    let winner = resolve(&set, &[tag(HostType::Long)]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::Long]);
}

#[test]
fn test_reference_argument_prefers_object_over_parsing() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Int], HostType::Void),
            make_candidate("f", vec![HostType::Object], HostType::Void),
        ],
    );

    let winner = resolve(&set, &[tag(HostType::String)]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::Object]);
}

#[test]
fn test_array_boxing_ranks_like_scalar_boxing() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Long], HostType::Void),
            make_candidate("f", vec![HostType::Object], HostType::Void),
        ],
    );
    let winner = resolve(&set, &[tag(HostType::Int)]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::Long]);

    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::array(HostType::Long)], HostType::Void),
            make_candidate("f", vec![HostType::array(HostType::Object)], HostType::Void),
        ],
    );
    let winner = resolve(&set, &[tag(HostType::array(HostType::Int))]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::array(HostType::Long)]);

    let winner = resolve(&set, &[tag(HostType::array(HostType::String))]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::array(HostType::Object)]);
}

#[test]
fn test_fixed_arity_suppresses_variadic() {
    let set = make_set(
        "join",
        vec![
            make_candidate("join", vec![HostType::String], HostType::String).variadic(),
            make_candidate("join", vec![HostType::String, HostType::String], HostType::String),
        ],
    );

    let winner = resolve(&set, &[tag(HostType::String), tag(HostType::String)]).unwrap();
    assert!(!winner.is_variadic());
    assert_eq!(winner.index(), 1);
}

#[test]
fn test_variadic_used_when_no_fixed_arity_fits() {
    let set = make_set(
        "join",
        vec![
            make_candidate("join", vec![HostType::String], HostType::String).variadic(),
            make_candidate("join", vec![HostType::String, HostType::String], HostType::String),
        ],
    );

    let three = [tag(HostType::String), tag(HostType::String), tag(HostType::String)];
    assert!(resolve(&set, &three).unwrap().is_variadic());
    assert!(resolve(&set, &[]).unwrap().is_variadic());
}

#[test]
fn test_variadic_tail_scored_against_element_type() {
    let set = make_set(
        "sum",
        vec![make_candidate("sum", vec![HostType::String, HostType::Int], HostType::Long).variadic()],
    );

    assert!(resolve(&set, &[tag(HostType::String), tag(HostType::Int), tag(HostType::Short)]).is_ok());
    let result = resolve(&set, &[tag(HostType::String), tag(HostType::Int), tag(HostType::Bool)]);
    assert!(matches!(result, Err(ResolutionError::NoMatch(_))));
}

#[test]
fn test_crossed_parameters_are_ambiguous() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Int, HostType::Long], HostType::Void),
            make_candidate("f", vec![HostType::Long, HostType::Int], HostType::Void),
        ],
    );

    for tags in [
        [tag(HostType::Int), tag(HostType::Int)],
        [tag(HostType::Short), tag(HostType::Short)],
    ] {
        match resolve(&set, &tags) {
            Err(ResolutionError::Ambiguous(err)) => {
                assert_eq!(err.member_name, "f");
                assert_eq!(err.candidates.len(), 2);
            }
            other => panic!("Expected Ambiguous, got {:?}", other),
        }
    }
}

#[test]
fn test_identical_signatures_are_ambiguous() {
    let set = make_set(
        "foo",
        vec![
            make_candidate("foo", vec![HostType::Int], HostType::Int),
            make_candidate("foo", vec![HostType::Int], HostType::Long),
        ],
    );

    let result = resolve(&set, &[tag(HostType::Int)]);
    assert!(matches!(result, Err(ResolutionError::Ambiguous(_))));
}

#[test]
fn test_specificity_breaks_distance_tie() {
    let (animal, dog, _) = zoo();
    let set = make_set(
        "feed",
        vec![
            make_candidate("feed", vec![HostType::Object], HostType::Void),
            make_candidate("feed", vec![HostType::class(&animal)], HostType::Void),
        ],
    );

    let winner = resolve(&set, &[tag(HostType::class(&dog))]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::class(&animal)]);
}

#[test]
fn test_nil_prefers_reference_parameters() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Int], HostType::Void),
            make_candidate("f", vec![HostType::String], HostType::Void),
        ],
    );

    let winner = resolve(&set, &[TypeTag::Nil]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::String]);
}

#[test]
fn test_userdata_carrying_class() {
    let (animal, dog, rock) = zoo();
    let set = make_set(
        "adopt",
        vec![
            make_candidate("adopt", vec![HostType::class(&animal)], HostType::Void),
            make_candidate("adopt", vec![HostType::class(&rock)], HostType::Void),
        ],
    );

    let winner = resolve(&set, &[TypeTag::Userdata(Some(HostType::class(&dog)))]).unwrap();
    assert_eq!(winner.param_types(), &[HostType::class(&animal)]);

    let result = resolve(&set, &[TypeTag::Userdata(None)]);
    assert!(matches!(result, Err(ResolutionError::NoMatch(_))));
}

#[test]
fn test_static_context_filters_candidates() {
    let set = make_set(
        "size",
        vec![
            make_candidate("size", vec![], HostType::Int).into_static(),
            make_candidate("size", vec![], HostType::Long),
        ],
    );
    let resolver = OverloadResolver::new();

    let on_type = resolver.resolve(&set, Dispatch::Static, &[]).unwrap();
    assert!(on_type.is_static());
    assert_eq!(on_type.return_type(), &HostType::Int);

    let on_instance = resolver.resolve(&set, Dispatch::Instance, &[]).unwrap();
    assert!(!on_instance.is_static());
    assert_eq!(on_instance.return_type(), &HostType::Long);
}

#[test]
fn test_constructors_need_static_dispatch() {
    let point = ClassRef::new("Point");
    let set = OverloadSet::new(
        &point,
        "new",
        vec![
            Arc::new(MemberDescriptor::constructor(&point, vec![HostType::Int, HostType::Int])),
            Arc::new(MemberDescriptor::proxy_constructor(&point)),
        ],
    );
    let resolver = OverloadResolver::new();

    let ctor = resolver
        .resolve(&set, Dispatch::Static, &[tag(HostType::Int), tag(HostType::Int)])
        .unwrap();
    assert_eq!(ctor.param_count(), 2);

    let proxy = resolver
        .resolve(&set, Dispatch::Static, &[TypeTag::Userdata(None)])
        .unwrap();
    assert_eq!(proxy.param_types(), &[HostType::Handle]);

    let result = resolver.resolve(&set, Dispatch::Instance, &[tag(HostType::Int), tag(HostType::Int)]);
    assert!(matches!(result, Err(ResolutionError::NoMatch(_))));
}

#[test]
fn test_fields_are_not_candidates() {
    let host = owner();
    let set = OverloadSet::new(
        &host,
        "count",
        vec![Arc::new(MemberDescriptor::field(&host, "count", HostType::Int, true))],
    );

    let result = resolve(&set, &[]);
    assert!(matches!(result, Err(ResolutionError::NoMatch(_))));
}

#[test]
fn test_no_match_lists_every_candidate() {
    let set = make_set(
        "add",
        vec![
            make_candidate("add", vec![HostType::Int, HostType::Int], HostType::Int),
            make_candidate("add", vec![HostType::Bool], HostType::Bool),
        ],
    );

    match resolve(&set, &[tag(HostType::Int)]) {
        Err(ResolutionError::NoMatch(err)) => {
            assert_eq!(err.owner, "Host");
            assert_eq!(err.arg_tags, vec![tag(HostType::Int)]);
            assert_eq!(err.candidates.len(), 2);
            let message = err.to_string();
            assert!(message.starts_with("no overload of `Host.add` accepts (int)"));
            assert!(message.contains("Host.add(int, int) -> int"));
        }
        other => panic!("Expected NoMatch, got {:?}", other),
    }
}

#[test]
fn test_empty_set_is_no_match() {
    let set = make_set("ghost", vec![]);
    let err = resolve(&set, &[]).unwrap_err();
    assert_eq!(err.member_name(), "ghost");
    assert!(err.to_string().ends_with("no candidates declared"));
}

#[test]
fn test_resolution_is_deterministic() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Double], HostType::Void),
            make_candidate("f", vec![HostType::Long], HostType::Void),
            make_candidate("f", vec![HostType::String], HostType::Void),
        ],
    );
    let tags = [tag(HostType::Int)];

    let first = resolve(&set, &tags);
    for _ in 0..10 {
        let again = resolve(&set, &tags);
        match (&first, &again) {
            (Ok(a), Ok(b)) => assert!(Arc::ptr_eq(a, b)),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("Outcome changed between runs"),
        }
    }
}

#[test]
fn test_is_more_specific() {
    let (animal, dog, _) = zoo();
    let resolver = OverloadResolver::new();
    let general = make_candidate("f", vec![HostType::class(&animal), HostType::Object], HostType::Void);
    let narrow = make_candidate("f", vec![HostType::class(&dog), HostType::Object], HostType::Void);

    assert!(resolver.is_more_specific(&narrow, &general, 2));
    assert!(!resolver.is_more_specific(&general, &narrow, 2));
    assert!(!resolver.is_more_specific(&narrow, &narrow, 2));
}

struct FlatOracle;

impl DistanceOracle for FlatOracle {
    fn distance(&self, _tag: &TypeTag, _target: &HostType) -> Distance {
        Distance::PARSE
    }
}

#[test]
fn test_custom_oracle() {
    let set = make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Bool], HostType::Void),
            make_candidate("f", vec![HostType::Int], HostType::Void),
        ],
    );
    let resolver = OverloadResolver::with_oracle(Arc::new(FlatOracle));

    // Every parameter fits equally and neither type is narrower.
    let result = resolver.resolve(&set, Dispatch::Instance, &[TypeTag::Function]);
    assert!(matches!(result, Err(ResolutionError::Ambiguous(_))));
}

// ============================================================
// Call-site cache
// ============================================================

fn signature(dispatch: Dispatch, tags: &[TypeTag]) -> CallSiteSignature {
    CallSiteSignature::new(&owner(), "f", dispatch, tags)
}

fn overloaded() -> OverloadSet {
    make_set(
        "f",
        vec![
            make_candidate("f", vec![HostType::Int], HostType::Void),
            make_candidate("f", vec![HostType::String], HostType::Void),
            make_candidate("f", vec![HostType::Int], HostType::Void).into_static(),
        ],
    )
}

#[test]
fn test_signature_display() {
    let sig = signature(Dispatch::Static, &[tag(HostType::Int), TypeTag::Nil]);
    assert_eq!(sig.to_string(), "static Host.f(int, nil)");
    assert_eq!(signature(Dispatch::Instance, &[]).to_string(), "Host.f()");
}

#[test]
fn test_cache_hit_returns_first_resolution() {
    let cache = CallSiteCache::new();
    let resolver = OverloadResolver::new();
    let set = overloaded();
    let tags = [tag(HostType::Int)];
    let sig = signature(Dispatch::Instance, &tags);

    let first = cache
        .lookup_or_resolve(&sig, || resolver.resolve(&set, Dispatch::Instance, &tags))
        .unwrap();
    let second = cache
        .lookup_or_resolve(&sig, || panic!("resolver must not run on a hit"))
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[test]
fn test_cleared_cache_resolves_to_same_member() {
    let cache = CallSiteCache::new();
    let resolver = OverloadResolver::new();
    let set = overloaded();
    let tags = [tag(HostType::String)];
    let sig = signature(Dispatch::Instance, &tags);

    let before = cache
        .lookup_or_resolve(&sig, || resolver.resolve(&set, Dispatch::Instance, &tags))
        .unwrap();
    cache.clear();
    assert!(cache.is_empty());
    let after = cache
        .lookup_or_resolve(&sig, || resolver.resolve(&set, Dispatch::Instance, &tags))
        .unwrap();

    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_failures_are_not_cached() {
    let cache = CallSiteCache::new();
    let resolver = OverloadResolver::new();
    let set = overloaded();
    let tags = [tag(HostType::Bool), tag(HostType::Bool)];
    let sig = signature(Dispatch::Instance, &tags);

    for _ in 0..2 {
        let result = cache.lookup_or_resolve(&sig, || resolver.resolve(&set, Dispatch::Instance, &tags));
        assert!(matches!(result, Err(ResolutionError::NoMatch(_))));
    }
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().misses, 2);
}

#[test]
fn test_dispatch_kind_is_part_of_key() {
    let cache = CallSiteCache::new();
    let resolver = OverloadResolver::new();
    let set = overloaded();
    let tags = [tag(HostType::Int)];

    let instance = cache
        .lookup_or_resolve(&signature(Dispatch::Instance, &tags), || {
            resolver.resolve(&set, Dispatch::Instance, &tags)
        })
        .unwrap();
    let on_type = cache
        .lookup_or_resolve(&signature(Dispatch::Static, &tags), || {
            resolver.resolve(&set, Dispatch::Static, &tags)
        })
        .unwrap();

    assert!(!instance.is_static());
    assert!(on_type.is_static());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_disabled_cache_always_resolves() {
    let cache = CallSiteCache::disabled();
    let calls = AtomicUsize::new(0);
    let set = overloaded();
    let tags = [tag(HostType::Int)];
    let sig = signature(Dispatch::Instance, &tags);

    for _ in 0..3 {
        cache
            .lookup_or_resolve(&sig, || {
                calls.fetch_add(1, Ordering::SeqCst);
                OverloadResolver::new().resolve(&set, Dispatch::Instance, &tags)
            })
            .unwrap();
    }

    assert!(!cache.is_enabled());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(cache.is_empty());
}

#[test]
fn test_concurrent_callers_agree_on_first_writer() {
    let cache = CallSiteCache::new();
    let sig = signature(Dispatch::Instance, &[tag(HostType::Int)]);
    let threads = 8;

    let results: Vec<Arc<MemberDescriptor>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let cache = &cache;
                let sig = &sig;
                scope.spawn(move || {
                    // Every thread produces its own allocation; only one may be published.
                    cache
                        .lookup_or_resolve(sig, || {
                            Ok(Arc::new(
                                make_candidate("f", vec![HostType::Int], HostType::Void).with_index(i),
                            ))
                        })
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let published = cache.lookup(&sig).unwrap();
    for result in &results {
        assert!(Arc::ptr_eq(result, &published));
    }

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits + stats.misses, threads as u64);
    assert_eq!(stats.lost_races, stats.misses - 1);
}
