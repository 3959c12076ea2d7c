//! Content model checks
//!
//! Post-build verification of model groups: depth-limited walks over the
//! particle tree with lazy group references resolved against the finished
//! maps, cycle detection for named groups, a unique-particle screen, and
//! the practical subset of the particle restriction rules used for
//! derivation-by-restriction and redefined groups.

use std::borrow::Cow;

use crate::error::{ErrorKind, SchemaError};
use crate::limits::Limits;
use crate::namespaces::QName;

use super::elements::XsdElement;
use super::global_maps::GlobalMaps;
use super::groups::{GroupParticle, ModelType, XsdGroup};
use super::wildcards::XsdAnyElement;

/// Outcome of a `check_model` walk
#[derive(Debug, Default)]
pub struct ModelCheckOutcome {
    /// Model errors found in the group tree
    pub errors: Vec<SchemaError>,
    /// Warnings (currently only depth exhaustion)
    pub warnings: Vec<String>,
}

/// Walk a content model to bounded depth and verify its consistency
///
/// Exceeding the configured depth emits a warning and stops descending;
/// group cycles reachable through non-emptiable particles and ambiguous
/// sibling particles emit `ModelError`s.
pub(crate) fn check_model(group: &XsdGroup, maps: &GlobalMaps, limits: &Limits) -> ModelCheckOutcome {
    let mut outcome = ModelCheckOutcome::default();
    let mut path: Vec<QName> = Vec::new();
    walk(group, maps, limits, 0, true, &mut path, &mut outcome);
    outcome
}

fn walk(
    group: &XsdGroup,
    maps: &GlobalMaps,
    limits: &Limits,
    depth: usize,
    required_path: bool,
    path: &mut Vec<QName>,
    outcome: &mut ModelCheckOutcome,
) {
    if depth > limits.max_model_depth {
        // Depth exhaustion is a warning, not a build error: the model may
        // well be consistent beyond the horizon
        if outcome.warnings.is_empty() {
            outcome.warnings.push(format!(
                "maximum model recursion depth {} exceeded",
                limits.max_model_depth
            ));
        }
        return;
    }

    check_sibling_particles(group, outcome);

    for particle in &group.particles {
        // A particle that may be skipped breaks the "required" chain that
        // makes a group cycle fatal
        let particle_required = required_path
            && !particle.occurs().is_emptiable()
            && group.model != ModelType::Choice;

        match particle {
            GroupParticle::Group(inner) => {
                walk(inner, maps, limits, depth + 1, particle_required, path, outcome);
            }
            GroupParticle::GroupRef { name, occurs } => {
                if path.contains(name) {
                    if particle_required && !occurs.is_emptiable() {
                        outcome.errors.push(
                            SchemaError::new(
                                ErrorKind::ModelError,
                                format!(
                                    "circular group reference '{}' cannot terminate",
                                    name
                                ),
                            )
                            .with_component(name.clone()),
                        );
                    }
                    continue;
                }
                match maps.built_group(name) {
                    Some(referent) => {
                        path.push(name.clone());
                        walk(referent, maps, limits, depth + 1, particle_required, path, outcome);
                        path.pop();
                    }
                    None => {
                        outcome.errors.push(
                            SchemaError::new(
                                ErrorKind::MissingComponent,
                                format!("reference to unknown group '{}'", name),
                            )
                            .with_component(name.clone()),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

/// Screen sibling element particles for ambiguity
///
/// Two particles with the same name must declare the same type; inside an
/// `all` group the same name may not appear twice at all.
fn check_sibling_particles(group: &XsdGroup, outcome: &mut ModelCheckOutcome) {
    let elements: Vec<&XsdElement> = group
        .particles
        .iter()
        .filter_map(|p| match p {
            GroupParticle::Element(e) => Some(e.as_ref()),
            _ => None,
        })
        .collect();

    for (i, first) in elements.iter().enumerate() {
        for second in &elements[i + 1..] {
            if first.name != second.name {
                continue;
            }
            if group.model == ModelType::All {
                outcome.errors.push(
                    SchemaError::new(
                        ErrorKind::ModelError,
                        format!("element '{}' appears twice in an 'all' group", first.name),
                    )
                    .with_component(first.name.clone()),
                );
            } else if first.type_ != second.type_ {
                outcome.errors.push(
                    SchemaError::new(
                        ErrorKind::ModelError,
                        format!(
                            "sibling particles '{}' declare inconsistent types",
                            first.name
                        ),
                    )
                    .with_component(first.name.clone()),
                );
            }
        }
    }
}

/// A particle with group references resolved for comparison
enum ResolvedParticle<'a> {
    Element(&'a XsdElement),
    Any(&'a XsdAnyElement),
    Group(Cow<'a, XsdGroup>),
}

fn resolve_particle<'a>(particle: &'a GroupParticle, maps: &'a GlobalMaps) -> Option<ResolvedParticle<'a>> {
    match particle {
        GroupParticle::Element(e) => Some(ResolvedParticle::Element(e)),
        GroupParticle::Any(a) => Some(ResolvedParticle::Any(a)),
        GroupParticle::Group(g) => Some(ResolvedParticle::Group(Cow::Borrowed(g))),
        GroupParticle::GroupRef { name, occurs } => maps.built_group(name).map(|referent| {
            let mut group = referent.clone();
            group.occurs = *occurs;
            ResolvedParticle::Group(Cow::Owned(group))
        }),
    }
}

/// True when `derived` is a valid particle restriction of `base`
///
/// Implements the practical subset of the W3C rules: occurrence
/// narrowing, per-name element narrowing, wildcard narrowing, and
/// compositor compatibility (same compositor, a sequence restricting a
/// choice, or a sequence restricting an `all`). Unprovable cases err on
/// the permissive side.
pub(crate) fn is_valid_restriction(
    derived: &XsdGroup,
    base: &XsdGroup,
    maps: &GlobalMaps,
    limits: &Limits,
) -> bool {
    restriction_holds(derived, base, maps, limits.max_model_depth)
}

fn restriction_holds(derived: &XsdGroup, base: &XsdGroup, maps: &GlobalMaps, depth: usize) -> bool {
    if depth == 0 {
        return true; // benefit of the doubt past the depth bound
    }
    if !derived.occurs.restricts(&base.occurs) {
        return false;
    }

    match (derived.model, base.model) {
        (ModelType::Sequence, ModelType::Sequence) => ordered_mapping(derived, base, maps, depth),
        (ModelType::All, ModelType::All) => named_mapping(derived, base, maps, depth),
        (ModelType::Choice, ModelType::Choice) => subset_mapping(derived, base, maps, depth),
        (ModelType::Sequence, ModelType::Choice) => subset_mapping(derived, base, maps, depth),
        (ModelType::Sequence, ModelType::All) => named_mapping(derived, base, maps, depth),
        _ => false,
    }
}

/// Order-preserving mapping for sequence against sequence
fn ordered_mapping(derived: &XsdGroup, base: &XsdGroup, maps: &GlobalMaps, depth: usize) -> bool {
    let base_particles: Vec<_> = base.particles.iter().collect();
    let mut next_base = 0;

    'derived: for derived_particle in &derived.particles {
        while next_base < base_particles.len() {
            let base_particle = base_particles[next_base];
            if particle_restricts(derived_particle, base_particle, maps, depth) {
                next_base += 1;
                continue 'derived;
            }
            // The skipped base particle must be emptiable
            if !base_particle.is_emptiable() {
                return false;
            }
            next_base += 1;
        }
        return false;
    }

    // Remaining base particles must be emptiable
    base_particles[next_base..].iter().all(|p| p.is_emptiable())
}

/// Subset mapping: every derived particle matches some base particle
fn subset_mapping(derived: &XsdGroup, base: &XsdGroup, maps: &GlobalMaps, depth: usize) -> bool {
    derived.particles.iter().all(|d| {
        base.particles
            .iter()
            .any(|b| particle_restricts(d, b, maps, depth))
    })
}

/// Name-driven mapping for a sequence restricting an `all` group
fn named_mapping(derived: &XsdGroup, base: &XsdGroup, maps: &GlobalMaps, depth: usize) -> bool {
    let mut used = vec![false; base.particles.len()];

    for derived_particle in &derived.particles {
        let mut matched = false;
        for (i, base_particle) in base.particles.iter().enumerate() {
            if !used[i] && particle_restricts(derived_particle, base_particle, maps, depth) {
                used[i] = true;
                matched = true;
                break;
            }
        }
        if !matched {
            return false;
        }
    }

    base.particles
        .iter()
        .zip(used)
        .all(|(p, consumed)| consumed || p.is_emptiable())
}

fn particle_restricts(
    derived: &GroupParticle,
    base: &GroupParticle,
    maps: &GlobalMaps,
    depth: usize,
) -> bool {
    if depth == 0 {
        return true; // benefit of the doubt past the depth bound
    }
    let (Some(derived), Some(base)) = (resolve_particle(derived, maps), resolve_particle(base, maps))
    else {
        return true; // unresolved references are reported elsewhere
    };

    match (&derived, &base) {
        (ResolvedParticle::Element(d), ResolvedParticle::Element(b)) => {
            d.name == b.name
                && d.occurs.restricts(&b.occurs)
                && types_compatible(d, b)
        }
        (ResolvedParticle::Element(d), ResolvedParticle::Any(b)) => {
            d.occurs.restricts(&b.occurs) && b.namespace.admits(d.name.namespace(), None)
        }
        (ResolvedParticle::Any(d), ResolvedParticle::Any(b)) => {
            d.occurs.restricts(&b.occurs) && d.namespace.is_subset(&b.namespace)
        }
        (ResolvedParticle::Group(d), ResolvedParticle::Group(b)) => {
            restriction_holds(d, b, maps, depth - 1)
        }
        (ResolvedParticle::Element(d), ResolvedParticle::Group(b)) => {
            // An element may stand for a group whose content reduces to it
            b.particles.len() == 1
                && d.occurs.restricts(&b.occurs)
                && particle_restricts(
                    &GroupParticle::Element(Box::new((*d).clone())),
                    &b.particles[0],
                    maps,
                    depth - 1,
                )
        }
        _ => false,
    }
}

fn types_compatible(derived: &XsdElement, base: &XsdElement) -> bool {
    use super::elements::ElementType;
    match (&derived.type_, &base.type_) {
        (_, ElementType::AnyType) => true,
        (ElementType::Named(d), ElementType::Named(b)) => {
            d == b || b == &QName::xsd("anyType")
        }
        // Inline types cannot be compared structurally here; accept
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::elements::ElementType;
    use crate::validators::particles::Occurs;

    fn element(name: &str, occurs: Occurs) -> GroupParticle {
        GroupParticle::Element(Box::new(XsdElement {
            name: QName::local(name),
            type_: ElementType::AnyType,
            occurs,
            qualified: false,
            nillable: false,
            abstract_: false,
            default: None,
            fixed: None,
            is_ref: false,
            substitution_group: None,
            identities: Vec::new(),
            block: Default::default(),
            final_: Default::default(),
            annotation: None,
            schema: 0,
            global: false,
            errors: Vec::new(),
        }))
    }

    fn sequence(particles: Vec<GroupParticle>) -> XsdGroup {
        let mut group = XsdGroup::empty_sequence(0);
        group.particles = particles;
        group
    }

    #[test]
    fn test_sequence_restriction_narrows_occurs() {
        let base = sequence(vec![
            element("a", Occurs::zero_or_more()),
            element("b", Occurs::optional()),
        ]);
        let derived = sequence(vec![element("a", Occurs::once())]);

        let maps = GlobalMaps::new();
        let limits = Limits::default();
        assert!(is_valid_restriction(&derived, &base, &maps, &limits));
    }

    #[test]
    fn test_restriction_cannot_add_particles() {
        let base = sequence(vec![element("a", Occurs::once())]);
        let derived = sequence(vec![
            element("a", Occurs::once()),
            element("extra", Occurs::once()),
        ]);

        let maps = GlobalMaps::new();
        let limits = Limits::default();
        assert!(!is_valid_restriction(&derived, &base, &maps, &limits));
    }

    #[test]
    fn test_restriction_cannot_skip_required_base() {
        let base = sequence(vec![
            element("a", Occurs::once()),
            element("b", Occurs::once()),
        ]);
        let derived = sequence(vec![element("b", Occurs::once())]);

        let maps = GlobalMaps::new();
        let limits = Limits::default();
        assert!(!is_valid_restriction(&derived, &base, &maps, &limits));
    }

    #[test]
    fn test_sequence_restricting_choice() {
        let mut base = sequence(vec![
            element("a", Occurs::once()),
            element("b", Occurs::once()),
        ]);
        base.model = ModelType::Choice;
        let derived = sequence(vec![element("b", Occurs::once())]);

        let maps = GlobalMaps::new();
        let limits = Limits::default();
        assert!(is_valid_restriction(&derived, &base, &maps, &limits));
    }

    #[test]
    fn test_check_model_flags_duplicate_all_members() {
        let mut group = sequence(vec![
            element("a", Occurs::once()),
            element("a", Occurs::once()),
        ]);
        group.model = ModelType::All;

        let maps = GlobalMaps::new();
        let outcome = check_model(&group, &maps, &Limits::default());
        assert!(outcome.errors.iter().any(|e| e.kind == ErrorKind::ModelError));
    }

    #[test]
    fn test_check_model_flags_unterminated_cycle() {
        // A group whose single required particle is a reference to itself
        let name = QName::local("loop");
        let mut inner = XsdGroup::empty_sequence(0);
        inner.particles.push(GroupParticle::GroupRef {
            name: name.clone(),
            occurs: Occurs::once(),
        });
        inner.name = Some(name.clone());
        inner.global = true;

        let mut maps = GlobalMaps::new();
        maps.groups.insert(
            name.clone(),
            super::super::global_maps::GlobalEntry::Built(inner.clone()),
        );

        // Start the walk from inside the named group, as the coordinator does
        let mut outcome = ModelCheckOutcome::default();
        let mut path = vec![name.clone()];
        walk(&inner, &maps, &Limits::default(), 0, true, &mut path, &mut outcome);
        assert!(outcome.errors.iter().any(|e| e.kind == ErrorKind::ModelError));
    }

    #[test]
    fn test_check_model_allows_skippable_cycle() {
        let name = QName::local("loop");
        let mut inner = XsdGroup::empty_sequence(0);
        inner.particles.push(GroupParticle::GroupRef {
            name: name.clone(),
            occurs: Occurs::optional(),
        });
        inner.name = Some(name.clone());

        let mut maps = GlobalMaps::new();
        maps.groups.insert(
            name.clone(),
            super::super::global_maps::GlobalEntry::Built(inner.clone()),
        );

        let mut outcome = ModelCheckOutcome::default();
        let mut path = vec![name.clone()];
        walk(&inner, &maps, &Limits::default(), 0, true, &mut path, &mut outcome);
        assert!(outcome.errors.is_empty());
    }
}
