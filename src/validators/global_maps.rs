//! Global component maps
//!
//! Six QName-keyed stores hold every global declaration of a schema set.
//! Each entry moves through a lifecycle: registered but unbuilt (one
//! descriptor, or a redefinition chain), `Building` while its factory
//! runs, and finally `Built`. Lookup builds on demand; re-entry on a
//! `Building` entry signals a circular reference to the caller instead of
//! recursing forever.

use indexmap::IndexMap;

use crate::error::{ErrorKind, Result, SchemaError};
use crate::namespaces::QName;

use super::attributes::{
    xsd_attribute_factory, xsd_attribute_group_factory, XsdAttribute, XsdAttributeGroup,
};
use super::base::{BuildContext, SourceRef};
use super::complex_types::{xsd_complex_type_factory, XsdComplexType, XsdType};
use super::elements::{xsd_element_factory, XsdElement};
use super::groups::{xsd_group_factory, XsdGroup};
use super::notations::{xsd_notation_factory, XsdNotation};
use super::simple_types::{xsd_simple_type_factory, XsdSimpleType};

/// The kinds of global components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Notation declarations
    Notation,
    /// Type definitions (simple and complex share one symbol space)
    Type,
    /// Global attribute declarations
    Attribute,
    /// Attribute group definitions
    AttributeGroup,
    /// Model group definitions
    Group,
    /// Global element declarations
    Element,
}

impl ComponentKind {
    /// All kinds, in the order earlier kinds are referenced by later ones
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Notation,
        ComponentKind::Type,
        ComponentKind::Attribute,
        ComponentKind::AttributeGroup,
        ComponentKind::Group,
        ComponentKind::Element,
    ];

    /// Human-readable kind name
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Notation => "notation",
            ComponentKind::Type => "type",
            ComponentKind::Attribute => "attribute",
            ComponentKind::AttributeGroup => "attribute group",
            ComponentKind::Group => "group",
            ComponentKind::Element => "element",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle entry of one global component
#[derive(Debug, Clone)]
pub enum GlobalEntry<T> {
    /// Registered descriptors: the original at index 0, redefinitions after
    Unresolved(Vec<SourceRef>),
    /// The factory for this entry is currently running
    Building(SourceRef),
    /// The finished component
    Built(T),
}

impl<T> GlobalEntry<T> {
    /// The built component, when finished
    pub fn built(&self) -> Option<&T> {
        match self {
            GlobalEntry::Built(t) => Some(t),
            _ => None,
        }
    }

    /// True when the entry is built
    pub fn is_built(&self) -> bool {
        matches!(self, GlobalEntry::Built(_))
    }
}

/// The six keyed stores of global declarations
#[derive(Debug, Clone, Default)]
pub struct GlobalMaps {
    /// Notation declarations
    pub notations: IndexMap<QName, GlobalEntry<XsdNotation>>,
    /// Global types, simple and complex
    pub types: IndexMap<QName, GlobalEntry<XsdType>>,
    /// Global attribute declarations
    pub attributes: IndexMap<QName, GlobalEntry<XsdAttribute>>,
    /// Attribute group definitions
    pub attribute_groups: IndexMap<QName, GlobalEntry<XsdAttributeGroup>>,
    /// Model group definitions
    pub groups: IndexMap<QName, GlobalEntry<XsdGroup>>,
    /// Global element declarations
    pub elements: IndexMap<QName, GlobalEntry<XsdElement>>,
}

/// A borrowed view of one built global component
#[derive(Debug, Clone, Copy)]
pub enum ComponentRef<'a> {
    /// A notation
    Notation(&'a XsdNotation),
    /// A type
    Type(&'a XsdType),
    /// An attribute
    Attribute(&'a XsdAttribute),
    /// An attribute group
    AttributeGroup(&'a XsdAttributeGroup),
    /// A model group
    Group(&'a XsdGroup),
    /// An element
    Element(&'a XsdElement),
}

impl ComponentRef<'_> {
    /// The kind of the referenced component
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentRef::Notation(_) => ComponentKind::Notation,
            ComponentRef::Type(_) => ComponentKind::Type,
            ComponentRef::Attribute(_) => ComponentKind::Attribute,
            ComponentRef::AttributeGroup(_) => ComponentKind::AttributeGroup,
            ComponentRef::Group(_) => ComponentKind::Group,
            ComponentRef::Element(_) => ComponentKind::Element,
        }
    }

    /// The component name, when named
    pub fn name(&self) -> Option<&QName> {
        match self {
            ComponentRef::Notation(n) => Some(&n.name),
            ComponentRef::Type(t) => t.name(),
            ComponentRef::Attribute(a) => Some(&a.name),
            ComponentRef::AttributeGroup(g) => g.name.as_ref(),
            ComponentRef::Group(g) => g.name.as_ref(),
            ComponentRef::Element(e) => Some(&e.name),
        }
    }
}

fn register_entry<T>(map: &mut IndexMap<QName, GlobalEntry<T>>, name: QName, source: SourceRef) {
    match map.get_mut(&name) {
        None => {
            map.insert(name, GlobalEntry::Unresolved(vec![source]));
        }
        Some(GlobalEntry::Unresolved(chain)) => chain.push(source),
        // A built or building entry keeps its first registration; later
        // duplicates surface through the loader's duplicate checks
        Some(_) => {}
    }
}

fn append_redefinition<T>(
    map: &mut IndexMap<QName, GlobalEntry<T>>,
    name: &QName,
    source: SourceRef,
) -> std::result::Result<(), SchemaError> {
    match map.get_mut(name) {
        Some(GlobalEntry::Unresolved(chain)) => {
            chain.push(source);
            Ok(())
        }
        _ => Err(SchemaError::new(
            ErrorKind::NotARedefinition,
            format!("'{}' redefines a component its origin never declared", name),
        )
        .with_component(name.clone())),
    }
}

fn replace_entry<T>(map: &mut IndexMap<QName, GlobalEntry<T>>, name: QName, source: SourceRef) {
    map.insert(name, GlobalEntry::Unresolved(vec![source]));
}

impl GlobalMaps {
    /// Create empty maps
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all stores
    pub fn len(&self) -> usize {
        self.notations.len()
            + self.types.len()
            + self.attributes.len()
            + self.attribute_groups.len()
            + self.groups.len()
            + self.elements.len()
    }

    /// True when every store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all stores
    pub fn clear(&mut self) {
        self.notations.clear();
        self.types.clear();
        self.attributes.clear();
        self.attribute_groups.clear();
        self.groups.clear();
        self.elements.clear();
    }

    /// True when every entry in every store is built
    pub fn all_built(&self) -> bool {
        self.notations.values().all(GlobalEntry::is_built)
            && self.types.values().all(GlobalEntry::is_built)
            && self.attributes.values().all(GlobalEntry::is_built)
            && self.attribute_groups.values().all(GlobalEntry::is_built)
            && self.groups.values().all(GlobalEntry::is_built)
            && self.elements.values().all(GlobalEntry::is_built)
    }

    /// Register a declaration descriptor under a kind
    pub(crate) fn register(&mut self, kind: ComponentKind, name: QName, source: SourceRef) {
        match kind {
            ComponentKind::Notation => register_entry(&mut self.notations, name, source),
            ComponentKind::Type => register_entry(&mut self.types, name, source),
            ComponentKind::Attribute => register_entry(&mut self.attributes, name, source),
            ComponentKind::AttributeGroup => {
                register_entry(&mut self.attribute_groups, name, source)
            }
            ComponentKind::Group => register_entry(&mut self.groups, name, source),
            ComponentKind::Element => register_entry(&mut self.elements, name, source),
        }
    }

    /// Append a redefinition descriptor to an existing entry
    pub(crate) fn register_redefinition(
        &mut self,
        kind: ComponentKind,
        name: &QName,
        source: SourceRef,
    ) -> std::result::Result<(), SchemaError> {
        match kind {
            ComponentKind::Type => append_redefinition(&mut self.types, name, source),
            ComponentKind::Group => append_redefinition(&mut self.groups, name, source),
            ComponentKind::AttributeGroup => {
                append_redefinition(&mut self.attribute_groups, name, source)
            }
            _ => Err(SchemaError::new(
                ErrorKind::NotARedefinition,
                format!("components of kind '{}' cannot be redefined", kind),
            )),
        }
    }

    /// Replace a descriptor, the `xs:override` semantics
    pub(crate) fn replace(&mut self, kind: ComponentKind, name: QName, source: SourceRef) {
        match kind {
            ComponentKind::Notation => replace_entry(&mut self.notations, name, source),
            ComponentKind::Type => replace_entry(&mut self.types, name, source),
            ComponentKind::Attribute => replace_entry(&mut self.attributes, name, source),
            ComponentKind::AttributeGroup => {
                replace_entry(&mut self.attribute_groups, name, source)
            }
            ComponentKind::Group => replace_entry(&mut self.groups, name, source),
            ComponentKind::Element => replace_entry(&mut self.elements, name, source),
        }
    }

    /// Seed a built type, used by the built-in factory; keeps an existing
    /// entry untouched
    pub(crate) fn seed_type(&mut self, name: QName, component: XsdType) {
        self.types.entry(name).or_insert(GlobalEntry::Built(component));
    }

    /// The built type with the given name
    pub fn built_type(&self, name: &QName) -> Option<&XsdType> {
        self.types.get(name).and_then(GlobalEntry::built)
    }

    /// The built element with the given name
    pub fn built_element(&self, name: &QName) -> Option<&XsdElement> {
        self.elements.get(name).and_then(GlobalEntry::built)
    }

    /// The built attribute with the given name
    pub fn built_attribute(&self, name: &QName) -> Option<&XsdAttribute> {
        self.attributes.get(name).and_then(GlobalEntry::built)
    }

    /// The built attribute group with the given name
    pub fn built_attribute_group(&self, name: &QName) -> Option<&XsdAttributeGroup> {
        self.attribute_groups.get(name).and_then(GlobalEntry::built)
    }

    /// The built group with the given name
    pub fn built_group(&self, name: &QName) -> Option<&XsdGroup> {
        self.groups.get(name).and_then(GlobalEntry::built)
    }

    /// The built notation with the given name
    pub fn built_notation(&self, name: &QName) -> Option<&XsdNotation> {
        self.notations.get(name).and_then(GlobalEntry::built)
    }

    /// Look up a built component under an expected kind
    ///
    /// Fails with a `MissingComponent` error when the name is absent from
    /// every store, and with `WrongKind` when it is registered under a
    /// different kind than requested.
    pub fn lookup(&self, kind: ComponentKind, name: &QName) -> std::result::Result<ComponentRef<'_>, SchemaError> {
        let found: Option<ComponentRef<'_>> = match kind {
            ComponentKind::Notation => self.built_notation(name).map(ComponentRef::Notation),
            ComponentKind::Type => self.built_type(name).map(ComponentRef::Type),
            ComponentKind::Attribute => self.built_attribute(name).map(ComponentRef::Attribute),
            ComponentKind::AttributeGroup => self
                .built_attribute_group(name)
                .map(ComponentRef::AttributeGroup),
            ComponentKind::Group => self.built_group(name).map(ComponentRef::Group),
            ComponentKind::Element => self.built_element(name).map(ComponentRef::Element),
        };

        if let Some(component) = found {
            return Ok(component);
        }

        let other_kind = ComponentKind::ALL.iter().find(|k| {
            **k != kind
                && match k {
                    ComponentKind::Notation => self.notations.contains_key(name),
                    ComponentKind::Type => self.types.contains_key(name),
                    ComponentKind::Attribute => self.attributes.contains_key(name),
                    ComponentKind::AttributeGroup => self.attribute_groups.contains_key(name),
                    ComponentKind::Group => self.groups.contains_key(name),
                    ComponentKind::Element => self.elements.contains_key(name),
                }
        });

        match other_kind {
            Some(other) => Err(SchemaError::new(
                ErrorKind::WrongKind,
                format!("'{}' names a {} where a {} was requested", name, other, kind),
            )
            .with_component(name.clone())),
            None => Err(SchemaError::new(
                ErrorKind::MissingComponent,
                format!("missing a {} component for '{}'", kind, name),
            )
            .with_component(name.clone())),
        }
    }

    /// Iterate all built global components, store by store
    ///
    /// The order is the reference order between kinds: notations, types,
    /// attributes, attribute groups, groups, elements.
    pub fn iter_globals(&self) -> impl Iterator<Item = ComponentRef<'_>> {
        let notations = self
            .notations
            .values()
            .filter_map(GlobalEntry::built)
            .map(ComponentRef::Notation);
        let types = self
            .types
            .values()
            .filter_map(GlobalEntry::built)
            .map(ComponentRef::Type);
        let attributes = self
            .attributes
            .values()
            .filter_map(GlobalEntry::built)
            .map(ComponentRef::Attribute);
        let attribute_groups = self
            .attribute_groups
            .values()
            .filter_map(GlobalEntry::built)
            .map(ComponentRef::AttributeGroup);
        let groups = self
            .groups
            .values()
            .filter_map(GlobalEntry::built)
            .map(ComponentRef::Group);
        let elements = self
            .elements
            .values()
            .filter_map(GlobalEntry::built)
            .map(ComponentRef::Element);

        notations
            .chain(types)
            .chain(attributes)
            .chain(attribute_groups)
            .chain(groups)
            .chain(elements)
    }

    /// Iterate built components of one kind
    pub fn iter_components(&self, kind: ComponentKind) -> Box<dyn Iterator<Item = ComponentRef<'_>> + '_> {
        match kind {
            ComponentKind::Notation => Box::new(
                self.notations
                    .values()
                    .filter_map(GlobalEntry::built)
                    .map(ComponentRef::Notation),
            ),
            ComponentKind::Type => Box::new(
                self.types
                    .values()
                    .filter_map(GlobalEntry::built)
                    .map(ComponentRef::Type),
            ),
            ComponentKind::Attribute => Box::new(
                self.attributes
                    .values()
                    .filter_map(GlobalEntry::built)
                    .map(ComponentRef::Attribute),
            ),
            ComponentKind::AttributeGroup => Box::new(
                self.attribute_groups
                    .values()
                    .filter_map(GlobalEntry::built)
                    .map(ComponentRef::AttributeGroup),
            ),
            ComponentKind::Group => Box::new(
                self.groups
                    .values()
                    .filter_map(GlobalEntry::built)
                    .map(ComponentRef::Group),
            ),
            ComponentKind::Element => Box::new(
                self.elements
                    .values()
                    .filter_map(GlobalEntry::built)
                    .map(ComponentRef::Element),
            ),
        }
    }
}

/// Outcome of forcing one entry to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryState {
    /// The entry is built
    Built,
    /// The entry is currently building (circular reference)
    Circular,
    /// No entry with that name exists
    Missing,
}

/// Outcome of a type lookup from inside a factory, as an owned snapshot
#[derive(Debug)]
pub(crate) enum TypeLookup {
    /// A built simple type
    Simple(XsdSimpleType),
    /// A built complex type
    Complex(XsdComplexType),
    /// The type is on the current build path
    Circular,
    /// No type with that name exists
    Missing,
}

/// Outcome of a non-type reference lookup
#[derive(Debug)]
pub(crate) enum RefLookup<T> {
    /// The built referent
    Found(T),
    /// The referent is on the current build path
    Circular,
    /// No referent with that name exists
    Missing,
}

// Build functions, one per store. Each installs the `Building` sentinel
// before invoking the factory and applies pending redefinition descriptors
// after the original is built, keeping the pre-redefinition snapshot on
// the component's `redefine` field.

pub(crate) fn build_type(ctx: &mut BuildContext, name: &QName) -> Result<EntryState> {
    let chain = match ctx.maps.types.get(name) {
        None => return Ok(EntryState::Missing),
        Some(GlobalEntry::Built(_)) => return Ok(EntryState::Built),
        Some(GlobalEntry::Building(_)) => return Ok(EntryState::Circular),
        Some(GlobalEntry::Unresolved(chain)) => chain.clone(),
    };

    let first = chain[0].clone();
    let tag = first.elem.xsd_name().unwrap_or("");
    if tag != "simpleType" && tag != "complexType" {
        ctx.global_error(
            SchemaError::new(
                ErrorKind::WrongKind,
                format!("element '{}' is not a type declaration for '{}'", tag, name),
            )
            .with_component(name.clone()),
        )?;
        return Ok(EntryState::Missing);
    }

    ctx.maps
        .types
        .insert(name.clone(), GlobalEntry::Building(first.clone()));

    let built = if tag == "simpleType" {
        XsdType::Simple(xsd_simple_type_factory(
            ctx,
            &first.elem,
            first.schema,
            true,
            None,
        )?)
    } else {
        XsdType::Complex(xsd_complex_type_factory(
            ctx,
            &first.elem,
            first.schema,
            true,
            None,
        )?)
    };
    ctx.maps.types.insert(name.clone(), GlobalEntry::Built(built));

    // Re-enter the factory for each redefinition, in registration order
    for source in &chain[1..] {
        let previous = match ctx.maps.types.get(name).and_then(GlobalEntry::built) {
            Some(t) => t.clone(),
            None => break,
        };
        let redefined = match (source.elem.xsd_name().unwrap_or(""), previous) {
            ("simpleType", XsdType::Simple(prev)) => XsdType::Simple(xsd_simple_type_factory(
                ctx,
                &source.elem,
                source.schema,
                true,
                Some(prev),
            )?),
            ("complexType", XsdType::Complex(prev)) => XsdType::Complex(xsd_complex_type_factory(
                ctx,
                &source.elem,
                source.schema,
                true,
                Some(prev),
            )?),
            (tag, _) => {
                ctx.global_error(
                    SchemaError::new(
                        ErrorKind::NotARedefinition,
                        format!("redefinition of '{}' changes its kind to '{}'", name, tag),
                    )
                    .with_component(name.clone()),
                )?;
                continue;
            }
        };
        ctx.maps
            .types
            .insert(name.clone(), GlobalEntry::Built(redefined));
    }

    Ok(EntryState::Built)
}

pub(crate) fn build_notation(ctx: &mut BuildContext, name: &QName) -> Result<EntryState> {
    let chain = match ctx.maps.notations.get(name) {
        None => return Ok(EntryState::Missing),
        Some(GlobalEntry::Built(_)) => return Ok(EntryState::Built),
        Some(GlobalEntry::Building(_)) => return Ok(EntryState::Circular),
        Some(GlobalEntry::Unresolved(chain)) => chain.clone(),
    };

    let first = chain[0].clone();
    if !first.elem.is_xsd("notation") {
        ctx.global_error(
            SchemaError::new(
                ErrorKind::WrongKind,
                format!("entry for '{}' is not a notation declaration", name),
            )
            .with_component(name.clone()),
        )?;
        return Ok(EntryState::Missing);
    }

    ctx.maps
        .notations
        .insert(name.clone(), GlobalEntry::Building(first.clone()));
    let built = xsd_notation_factory(ctx, &first.elem, first.schema)?;
    ctx.maps
        .notations
        .insert(name.clone(), GlobalEntry::Built(built));
    Ok(EntryState::Built)
}

pub(crate) fn build_attribute(ctx: &mut BuildContext, name: &QName) -> Result<EntryState> {
    let chain = match ctx.maps.attributes.get(name) {
        None => return Ok(EntryState::Missing),
        Some(GlobalEntry::Built(_)) => return Ok(EntryState::Built),
        Some(GlobalEntry::Building(_)) => return Ok(EntryState::Circular),
        Some(GlobalEntry::Unresolved(chain)) => chain.clone(),
    };

    let first = chain[0].clone();
    if !first.elem.is_xsd("attribute") {
        ctx.global_error(
            SchemaError::new(
                ErrorKind::WrongKind,
                format!("entry for '{}' is not an attribute declaration", name),
            )
            .with_component(name.clone()),
        )?;
        return Ok(EntryState::Missing);
    }

    ctx.maps
        .attributes
        .insert(name.clone(), GlobalEntry::Building(first.clone()));
    let built = xsd_attribute_factory(ctx, &first.elem, first.schema, true, None)?;
    ctx.maps
        .attributes
        .insert(name.clone(), GlobalEntry::Built(built));
    Ok(EntryState::Built)
}

pub(crate) fn build_attribute_group(ctx: &mut BuildContext, name: &QName) -> Result<EntryState> {
    let chain = match ctx.maps.attribute_groups.get(name) {
        None => return Ok(EntryState::Missing),
        Some(GlobalEntry::Built(_)) => return Ok(EntryState::Built),
        Some(GlobalEntry::Building(_)) => return Ok(EntryState::Circular),
        Some(GlobalEntry::Unresolved(chain)) => chain.clone(),
    };

    let first = chain[0].clone();
    if !first.elem.is_xsd("attributeGroup") {
        ctx.global_error(
            SchemaError::new(
                ErrorKind::WrongKind,
                format!("entry for '{}' is not an attributeGroup definition", name),
            )
            .with_component(name.clone()),
        )?;
        return Ok(EntryState::Missing);
    }

    ctx.maps
        .attribute_groups
        .insert(name.clone(), GlobalEntry::Building(first.clone()));
    let built = xsd_attribute_group_factory(ctx, &first.elem, first.schema, true, None)?;
    ctx.maps
        .attribute_groups
        .insert(name.clone(), GlobalEntry::Built(built));

    for source in &chain[1..] {
        let previous = match ctx
            .maps
            .attribute_groups
            .get(name)
            .and_then(GlobalEntry::built)
        {
            Some(g) => g.clone(),
            None => break,
        };
        let redefined =
            xsd_attribute_group_factory(ctx, &source.elem, source.schema, true, Some(previous))?;
        ctx.maps
            .attribute_groups
            .insert(name.clone(), GlobalEntry::Built(redefined));
    }

    Ok(EntryState::Built)
}

pub(crate) fn build_group(ctx: &mut BuildContext, name: &QName) -> Result<EntryState> {
    let chain = match ctx.maps.groups.get(name) {
        None => return Ok(EntryState::Missing),
        Some(GlobalEntry::Built(_)) => return Ok(EntryState::Built),
        Some(GlobalEntry::Building(_)) => return Ok(EntryState::Circular),
        Some(GlobalEntry::Unresolved(chain)) => chain.clone(),
    };

    let first = chain[0].clone();
    if !first.elem.is_xsd("group") {
        ctx.global_error(
            SchemaError::new(
                ErrorKind::WrongKind,
                format!("entry for '{}' is not a group definition", name),
            )
            .with_component(name.clone()),
        )?;
        return Ok(EntryState::Missing);
    }

    ctx.maps
        .groups
        .insert(name.clone(), GlobalEntry::Building(first.clone()));
    let built = xsd_group_factory(ctx, &first.elem, first.schema, None)?;
    ctx.maps
        .groups
        .insert(name.clone(), GlobalEntry::Built(built));

    for source in &chain[1..] {
        let previous = match ctx.maps.groups.get(name).and_then(GlobalEntry::built) {
            Some(g) => g.clone(),
            None => break,
        };
        let redefined = xsd_group_factory(ctx, &source.elem, source.schema, Some(previous))?;
        ctx.maps
            .groups
            .insert(name.clone(), GlobalEntry::Built(redefined));
    }

    Ok(EntryState::Built)
}

pub(crate) fn build_element(ctx: &mut BuildContext, name: &QName) -> Result<EntryState> {
    let chain = match ctx.maps.elements.get(name) {
        None => return Ok(EntryState::Missing),
        Some(GlobalEntry::Built(_)) => return Ok(EntryState::Built),
        Some(GlobalEntry::Building(_)) => return Ok(EntryState::Circular),
        Some(GlobalEntry::Unresolved(chain)) => chain.clone(),
    };

    let first = chain[0].clone();
    if !first.elem.is_xsd("element") {
        ctx.global_error(
            SchemaError::new(
                ErrorKind::WrongKind,
                format!("entry for '{}' is not an element declaration", name),
            )
            .with_component(name.clone()),
        )?;
        return Ok(EntryState::Missing);
    }

    ctx.maps
        .elements
        .insert(name.clone(), GlobalEntry::Building(first.clone()));
    let built = xsd_element_factory(ctx, &first.elem, first.schema, true, None)?;
    ctx.maps
        .elements
        .insert(name.clone(), GlobalEntry::Built(built));
    Ok(EntryState::Built)
}

// Lookup wrappers used by factories. Each forces a build and returns an
// owned snapshot, keeping the borrow of the maps short.

pub(crate) fn lookup_type_clone(ctx: &mut BuildContext, name: &QName) -> Result<TypeLookup> {
    match build_type(ctx, name)? {
        EntryState::Built => match ctx.maps.built_type(name) {
            Some(XsdType::Simple(t)) => Ok(TypeLookup::Simple(t.clone())),
            Some(XsdType::Complex(t)) => Ok(TypeLookup::Complex(t.clone())),
            None => Ok(TypeLookup::Missing),
        },
        EntryState::Circular => Ok(TypeLookup::Circular),
        EntryState::Missing => Ok(TypeLookup::Missing),
    }
}

pub(crate) fn lookup_attribute_clone(
    ctx: &mut BuildContext,
    name: &QName,
) -> Result<RefLookup<XsdAttribute>> {
    match build_attribute(ctx, name)? {
        EntryState::Built => Ok(ctx
            .maps
            .built_attribute(name)
            .map(|a| RefLookup::Found(a.clone()))
            .unwrap_or(RefLookup::Missing)),
        EntryState::Circular => Ok(RefLookup::Circular),
        EntryState::Missing => Ok(RefLookup::Missing),
    }
}

pub(crate) fn lookup_attribute_group_clone(
    ctx: &mut BuildContext,
    name: &QName,
) -> Result<RefLookup<XsdAttributeGroup>> {
    match build_attribute_group(ctx, name)? {
        EntryState::Built => Ok(ctx
            .maps
            .built_attribute_group(name)
            .map(|g| RefLookup::Found(g.clone()))
            .unwrap_or(RefLookup::Missing)),
        EntryState::Circular => Ok(RefLookup::Circular),
        EntryState::Missing => Ok(RefLookup::Missing),
    }
}

pub(crate) fn lookup_group_exists(ctx: &mut BuildContext, name: &QName) -> Result<RefLookup<()>> {
    match build_group(ctx, name)? {
        EntryState::Built => Ok(RefLookup::Found(())),
        EntryState::Circular => Ok(RefLookup::Circular),
        EntryState::Missing => Ok(RefLookup::Missing),
    }
}

pub(crate) fn lookup_element_exists(ctx: &mut BuildContext, name: &QName) -> Result<RefLookup<()>> {
    match build_element(ctx, name)? {
        EntryState::Built => Ok(RefLookup::Found(())),
        EntryState::Circular => Ok(RefLookup::Circular),
        EntryState::Missing => Ok(RefLookup::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_promotes_to_chain() {
        let mut maps = GlobalMaps::new();
        let name = QName::local("T");
        let doc = crate::documents::Document::parse(
            r#"<xs:simpleType xmlns:xs="http://www.w3.org/2001/XMLSchema" name="T"/>"#,
        )
        .unwrap();
        let source = SourceRef {
            elem: doc.root.clone(),
            schema: 0,
        };

        maps.register(ComponentKind::Type, name.clone(), source.clone());
        match maps.types.get(&name) {
            Some(GlobalEntry::Unresolved(chain)) => assert_eq!(chain.len(), 1),
            other => panic!("unexpected entry: {:?}", other),
        }

        maps.register(ComponentKind::Type, name.clone(), source.clone());
        match maps.types.get(&name) {
            Some(GlobalEntry::Unresolved(chain)) => assert_eq!(chain.len(), 2),
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_redefinition_requires_existing_entry() {
        let mut maps = GlobalMaps::new();
        let doc = crate::documents::Document::parse(
            r#"<xs:group xmlns:xs="http://www.w3.org/2001/XMLSchema" name="G"/>"#,
        )
        .unwrap();
        let source = SourceRef {
            elem: doc.root.clone(),
            schema: 0,
        };

        let err = maps
            .register_redefinition(ComponentKind::Group, &QName::local("G"), source.clone())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotARedefinition);

        maps.register(ComponentKind::Group, QName::local("G"), source.clone());
        assert!(maps
            .register_redefinition(ComponentKind::Group, &QName::local("G"), source)
            .is_ok());
    }

    #[test]
    fn test_lookup_missing_vs_wrong_kind() {
        let mut maps = GlobalMaps::new();
        let name = QName::local("x");

        let err = maps.lookup(ComponentKind::Type, &name).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingComponent);

        // Register under elements; a type lookup must now say WrongKind
        let doc = crate::documents::Document::parse(
            r#"<xs:element xmlns:xs="http://www.w3.org/2001/XMLSchema" name="x"/>"#,
        )
        .unwrap();
        maps.register(
            ComponentKind::Element,
            name.clone(),
            SourceRef {
                elem: doc.root.clone(),
                schema: 0,
            },
        );

        let err = maps.lookup(ComponentKind::Type, &name).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WrongKind);
    }
}
