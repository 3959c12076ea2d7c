//! The globals coordinator
//!
//! [`XsdGlobals`] owns the global maps and every registered schema
//! document, drives the build pipeline (load, seed built-ins, force
//! construction, deferred passes, post-build checks) and is itself the
//! produced artifact: a validator-ready, fully cross-referenced component
//! graph.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::documents::{Document, Element};
use crate::error::{Error, ErrorKind, Result, SchemaError};
use crate::limits::Limits;
use crate::namespaces::{QName, XSD_NAMESPACE};
use crate::resources::{resolve_location, ResourceLoader};

use super::base::{
    BuildContext, SchemaId, ValidationAttempted, ValidationMode, Validity, XsdVersion,
};
use super::builders::{load_globals_for_tag, LOAD_PASSES};
use super::builtins::xsd_builtin_types_factory;
use super::complex_types::XsdType;
use super::elements::ElementType;
use super::global_maps::{
    build_attribute, build_attribute_group, build_element, build_group, build_notation,
    build_type, ComponentKind, ComponentRef, GlobalMaps,
};
use super::groups::XsdGroup;
use super::identities::{IdentityCategory, XsdIdentity};
use super::models::{check_model, is_valid_restriction};
use super::schemas::XsdSchema;

use super::base::DerivationMethod;

/// Coordinator for a set of related schema documents
///
/// Register schemas with [`add_schema`](Self::add_schema), then call
/// [`build`](Self::build). A built coordinator exposes the compiled
/// component graph. Cloning a coordinator and building the clone yields a
/// structurally equal graph.
#[derive(Debug, Clone)]
pub struct XsdGlobals {
    /// Selected XSD version
    pub version: XsdVersion,
    /// Validation mode governing error propagation
    pub validation: ValidationMode,
    /// Compilation limits
    pub limits: Limits,
    schemas: Vec<XsdSchema>,
    namespaces: IndexMap<String, Vec<SchemaId>>,
    locations: IndexMap<String, SchemaId>,
    /// The global component maps
    pub maps: GlobalMaps,
    /// Substitution group heads to member element names
    pub substitution_groups: IndexMap<QName, Vec<QName>>,
    /// Identity constraints by name
    pub constraints: IndexMap<QName, XsdIdentity>,
    errors: Vec<SchemaError>,
    warnings: Vec<String>,
    built: bool,
    checked: bool,
}

impl XsdGlobals {
    /// Create an empty coordinator
    pub fn new(version: XsdVersion, validation: ValidationMode) -> Self {
        Self {
            version,
            validation,
            limits: Limits::default(),
            schemas: Vec::new(),
            namespaces: IndexMap::new(),
            locations: IndexMap::new(),
            maps: GlobalMaps::new(),
            substitution_groups: IndexMap::new(),
            constraints: IndexMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            built: false,
            checked: false,
        }
    }

    /// Replace the compilation limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The registered schema documents, in registration order
    pub fn schemas(&self) -> &[XsdSchema] {
        &self.schemas
    }

    /// The schemas registered for a target namespace
    pub fn schemas_for_namespace(&self, namespace: Option<&str>) -> &[SchemaId] {
        self.namespaces
            .get(namespace.unwrap_or(""))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True once `build` completed
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// True once the post-build consistency checks have run
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Parse a schema source and register it with its closure of
    /// included, imported, redefined and overridden documents
    pub fn add_schema(&mut self, source: &str, loader: &dyn ResourceLoader) -> Result<SchemaId> {
        let doc = Document::parse(source)?;
        self.add_document(doc.root, None, None, None, loader, 0)
    }

    /// Fetch and register the schema at `location`
    pub fn add_schema_location(
        &mut self,
        location: &str,
        loader: &dyn ResourceLoader,
    ) -> Result<SchemaId> {
        let handle = loader.fetch(location, None)?;
        self.add_document(
            handle.root,
            Some(handle.location),
            handle.base_url,
            None,
            loader,
            0,
        )
    }

    fn add_document(
        &mut self,
        root: Arc<Element>,
        location: Option<String>,
        base_url: Option<url::Url>,
        chameleon_namespace: Option<String>,
        loader: &dyn ResourceLoader,
        depth: usize,
    ) -> Result<SchemaId> {
        self.limits.check_schema_depth(depth)?;

        let id = self.schemas.len();
        let schema = XsdSchema::parse(
            root.clone(),
            id,
            location.clone(),
            base_url.clone(),
            chameleon_namespace,
        )?;

        let namespace_key = schema.target_namespace.clone().unwrap_or_default();
        self.schemas.push(schema);
        self.namespaces.entry(namespace_key).or_default().push(id);
        if let Some(location) = &location {
            self.locations.insert(location.clone(), id);
        }
        self.built = false;
        self.checked = false;

        debug!(id, location = ?location, "registered schema document");

        self.process_directives(id, loader, depth)?;
        Ok(id)
    }

    /// Walk include/import/redefine/override children at registration time
    fn process_directives(
        &mut self,
        id: SchemaId,
        loader: &dyn ResourceLoader,
        depth: usize,
    ) -> Result<()> {
        let root = self.schemas[id].root.clone();
        let own_namespace = self.schemas[id].target_namespace.clone();
        let base_url = self.schemas[id].base_url.clone();

        for child in root.xsd_children() {
            let tag = child.xsd_name().unwrap_or("");
            match tag {
                "include" | "redefine" | "override" => {
                    if tag == "override" && self.version == XsdVersion::V10 {
                        self.schema_error(
                            id,
                            SchemaError::new(
                                ErrorKind::ForbiddenChild,
                                "override requires XSD 1.1",
                            ),
                        )?;
                        continue;
                    }
                    let Some(raw_location) = child.get("schemaLocation") else {
                        self.schema_error(
                            id,
                            SchemaError::new(
                                ErrorKind::MissingAttribute,
                                format!("{} requires a 'schemaLocation' attribute", tag),
                            ),
                        )?;
                        continue;
                    };
                    let raw_location = raw_location.to_string();

                    match self.fetch_and_register(
                        &raw_location,
                        base_url.as_ref(),
                        own_namespace.clone(),
                        loader,
                        depth,
                    ) {
                        Ok(included) => {
                            let included_declared =
                                self.schemas[included].declared_namespace.clone();
                            if included_declared.is_some() && included_declared != own_namespace {
                                self.schema_error(
                                    id,
                                    SchemaError::new(
                                        ErrorKind::InvalidDeclaration,
                                        format!(
                                            "{}d schema declares target namespace {:?}, expected {:?}",
                                            tag, included_declared, own_namespace
                                        ),
                                    ),
                                )?;
                            }
                            self.schemas[id].includes.insert(raw_location, included);
                        }
                        Err(err) => self.resource_error(id, &raw_location, err)?,
                    }
                }
                "import" => {
                    let import_namespace = child
                        .get("namespace")
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from);

                    if import_namespace == own_namespace && import_namespace.is_some() {
                        self.schema_error(
                            id,
                            SchemaError::new(
                                ErrorKind::InvalidDeclaration,
                                "import of the schema's own target namespace (use include)",
                            ),
                        )?;
                        continue;
                    }

                    let key = import_namespace.clone().unwrap_or_default();
                    match child.get("schemaLocation") {
                        Some(raw_location) => {
                            let raw_location = raw_location.to_string();
                            match self.fetch_and_register(
                                &raw_location,
                                base_url.as_ref(),
                                None,
                                loader,
                                depth,
                            ) {
                                Ok(imported) => {
                                    let declared =
                                        self.schemas[imported].declared_namespace.clone();
                                    if declared != import_namespace {
                                        self.schema_error(
                                            id,
                                            SchemaError::new(
                                                ErrorKind::InvalidDeclaration,
                                                format!(
                                                    "imported schema declares target namespace {:?}, expected {:?}",
                                                    declared, import_namespace
                                                ),
                                            ),
                                        )?;
                                    }
                                    self.schemas[id].imports.insert(key, Some(imported));
                                }
                                Err(err) => {
                                    self.resource_error(id, &raw_location, err)?;
                                    self.schemas[id].imports.insert(key, None);
                                }
                            }
                        }
                        None => {
                            // A location-less import only declares intent;
                            // the namespace may be satisfied by other
                            // registered schemas
                            self.schemas[id].imports.entry(key).or_insert(None);
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn fetch_and_register(
        &mut self,
        raw_location: &str,
        base_url: Option<&url::Url>,
        chameleon_namespace: Option<String>,
        loader: &dyn ResourceLoader,
        depth: usize,
    ) -> Result<SchemaId> {
        let resolved = resolve_location(raw_location, base_url);
        if let Some(&existing) = self.locations.get(&resolved) {
            return Ok(existing);
        }

        let handle = loader.fetch(raw_location, base_url)?;
        self.add_document(
            handle.root,
            Some(handle.location),
            handle.base_url,
            chameleon_namespace,
            loader,
            depth + 1,
        )
    }

    fn schema_error(&mut self, id: SchemaId, err: SchemaError) -> Result<()> {
        match self.validation {
            ValidationMode::Strict => Err(err.into()),
            ValidationMode::Lax => {
                self.schemas[id].errors.push(err);
                Ok(())
            }
            ValidationMode::Skip => Ok(()),
        }
    }

    fn resource_error(&mut self, id: SchemaId, location: &str, err: Error) -> Result<()> {
        let kind = match &err {
            Error::Xml(_) => ErrorKind::UnparsableXml,
            _ => ErrorKind::UnreachableLocation,
        };
        match self.validation {
            ValidationMode::Strict => Err(err),
            ValidationMode::Lax => {
                self.schemas[id]
                    .errors
                    .push(SchemaError::new(kind, format!("'{}': {}", location, err)));
                Ok(())
            }
            ValidationMode::Skip => Ok(()),
        }
    }

    /// Build the global maps
    ///
    /// Loads declarations of every not-yet-loaded schema, seeds the
    /// built-in types, forces construction of every registered global,
    /// resolves deferred references and runs the post-build checks.
    /// Building an already-built coordinator is a no-op.
    pub fn build(&mut self) -> Result<()> {
        if self.built && self.schemas.iter().all(|s| s.loaded) {
            return Ok(());
        }

        let pending: Vec<SchemaId> = self
            .schemas
            .iter()
            .filter(|s| !s.loaded)
            .map(|s| s.id)
            .collect();

        debug!(schemas = pending.len(), "loading global declarations");

        // Load declarations kind by kind, earlier kinds first
        for &(tag, kind) in LOAD_PASSES {
            load_globals_for_tag(
                &mut self.maps,
                &mut self.schemas,
                &pending,
                tag,
                kind,
                self.validation,
                self.version,
            )?;
        }
        for &id in &pending {
            self.schemas[id].loaded = true;
        }

        // Seed built-ins; user-declared entries (a meta-schema compiling
        // its own namespace) are never clobbered
        let builtin_schema = self
            .namespaces
            .get(XSD_NAMESPACE)
            .and_then(|ids| ids.first().copied())
            .unwrap_or(0);
        xsd_builtin_types_factory(&mut self.maps, builtin_schema);

        self.limits.check_components(self.maps.len())?;

        // Force construction of every global, kind by kind
        {
            let mut ctx = BuildContext {
                maps: &mut self.maps,
                schemas: &self.schemas,
                substitution_groups: &mut self.substitution_groups,
                constraints: &mut self.constraints,
                validation: self.validation,
                version: self.version,
                limits: &self.limits,
                errors: &mut self.errors,
            };

            let notation_names: Vec<QName> = ctx.maps.notations.keys().cloned().collect();
            for name in &notation_names {
                build_notation(&mut ctx, name)?;
            }
            let attribute_names: Vec<QName> = ctx.maps.attributes.keys().cloned().collect();
            for name in &attribute_names {
                build_attribute(&mut ctx, name)?;
            }
            let attribute_group_names: Vec<QName> =
                ctx.maps.attribute_groups.keys().cloned().collect();
            for name in &attribute_group_names {
                build_attribute_group(&mut ctx, name)?;
            }
            let type_names: Vec<QName> = ctx.maps.types.keys().cloned().collect();
            for name in &type_names {
                build_type(&mut ctx, name)?;
            }
            let element_names: Vec<QName> = ctx.maps.elements.keys().cloned().collect();
            for name in &element_names {
                build_element(&mut ctx, name)?;
            }
            let group_names: Vec<QName> = ctx.maps.groups.keys().cloned().collect();
            for name in &group_names {
                build_group(&mut ctx, name)?;
            }
        }

        // Deferred pass: in-model element declarations
        self.resolve_deferred_references()?;

        // Keyref resolution
        self.resolve_keyrefs()?;

        // Post-build consistency checks
        self.run_post_build_checks()?;

        if self.validation == ValidationMode::Strict && !self.maps.all_built() {
            return Err(Error::NotBuilt(
                "not all global components could be built".to_string(),
            ));
        }

        self.built = true;
        self.checked = true;
        debug!(components = self.maps.len(), "schema build complete");
        Ok(())
    }

    /// Verify the type and element references recorded inside model
    /// groups, now that every global is built
    fn resolve_deferred_references(&mut self) -> Result<()> {
        let mut errors = Vec::new();

        let check_group = |group: &XsdGroup, errors: &mut Vec<SchemaError>| {
            for element in group.iter_elements() {
                if element.is_ref {
                    if self.maps.built_element(&element.name).is_none() {
                        errors.push(
                            SchemaError::new(
                                ErrorKind::MissingComponent,
                                format!("reference to unknown element '{}'", element.name),
                            )
                            .with_component(element.name.clone()),
                        );
                    }
                } else if let ElementType::Named(type_name) = &element.type_ {
                    if self.maps.built_type(type_name).is_none() {
                        errors.push(
                            SchemaError::new(
                                ErrorKind::MissingComponent,
                                format!(
                                    "element '{}' declares unknown type '{}'",
                                    element.name, type_name
                                ),
                            )
                            .with_component(element.name.clone()),
                        );
                    }
                }
            }
        };

        for entry in self.maps.groups.values() {
            if let Some(group) = entry.built() {
                check_group(group, &mut errors);
            }
        }
        for entry in self.maps.types.values() {
            if let Some(XsdType::Complex(complex)) = entry.built() {
                if let Some(group) = complex.content_group() {
                    check_group(group, &mut errors);
                }
            }
        }
        for entry in self.maps.elements.values() {
            if let Some(element) = entry.built() {
                if let ElementType::Named(type_name) = &element.type_ {
                    if self.maps.built_type(type_name).is_none() {
                        errors.push(
                            SchemaError::new(
                                ErrorKind::MissingComponent,
                                format!(
                                    "element '{}' declares unknown type '{}'",
                                    element.name, type_name
                                ),
                            )
                            .with_component(element.name.clone()),
                        );
                    }
                }
                if let ElementType::Complex(complex) = &element.type_ {
                    if let Some(group) = complex.content_group() {
                        check_group(group, &mut errors);
                    }
                }
            }
        }

        self.record_errors(errors)
    }

    /// Resolve `keyref.refer` against the collected constraints
    fn resolve_keyrefs(&mut self) -> Result<()> {
        let mut errors = Vec::new();
        for (name, identity) in &self.constraints {
            if identity.category != IdentityCategory::Keyref {
                continue;
            }
            match &identity.refer {
                Some(refer) => match self.constraints.get(refer) {
                    Some(target) if target.category != IdentityCategory::Keyref => {}
                    Some(_) => errors.push(
                        SchemaError::new(
                            ErrorKind::ProhibitedReference,
                            format!("keyref '{}' refers to another keyref '{}'", name, refer),
                        )
                        .with_component(name.clone()),
                    ),
                    None => errors.push(
                        SchemaError::new(
                            ErrorKind::MissingComponent,
                            format!("keyref '{}' refers to unknown constraint '{}'", name, refer),
                        )
                        .with_component(name.clone()),
                    ),
                },
                None => {}
            }
        }
        self.record_errors(errors)
    }

    fn run_post_build_checks(&mut self) -> Result<()> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        self.check_substitution_groups(&mut errors);
        self.check_redefined_groups(&mut errors);
        self.check_complex_content_models(&mut errors, &mut warnings);

        for warning in &warnings {
            warn!("{}", warning);
        }
        self.warnings.extend(warnings);
        self.record_errors(errors)
    }

    /// Walk every head's transitive substitutes looking for cycles and
    /// type-incompatible members
    fn check_substitution_groups(&self, errors: &mut Vec<SchemaError>) {
        for (head, members) in &self.substitution_groups {
            if self.maps.built_element(head).is_none() {
                errors.push(
                    SchemaError::new(
                        ErrorKind::MissingComponent,
                        format!("substitution group head '{}' is not a global element", head),
                    )
                    .with_component(head.clone()),
                );
                continue;
            }

            // Transitive walk from the head
            let mut seen: HashSet<&QName> = HashSet::new();
            let mut stack: Vec<&QName> = members.iter().collect();
            while let Some(current) = stack.pop() {
                if current == head {
                    errors.push(
                        SchemaError::new(
                            ErrorKind::SubstitutionCycle,
                            format!(
                                "circularity found for substitution group with head element '{}'",
                                head
                            ),
                        )
                        .with_component(head.clone()),
                    );
                    break;
                }
                if !seen.insert(current) {
                    continue;
                }
                if let Some(transitive) = self.substitution_groups.get(current) {
                    stack.extend(transitive.iter());
                }
            }

            // Type compatibility of direct members
            let head_type = self
                .maps
                .built_element(head)
                .and_then(|e| e.type_name().cloned());
            let Some(head_type) = head_type else { continue };
            if head_type == QName::xsd("anyType") {
                continue;
            }
            for member in members {
                let member_type = self
                    .maps
                    .built_element(member)
                    .and_then(|e| e.type_name().cloned());
                if let Some(member_type) = member_type {
                    if !self.type_derives_from(&member_type, &head_type) {
                        errors.push(
                            SchemaError::new(
                                ErrorKind::IncompatibleSubstitution,
                                format!(
                                    "element '{}' of type '{}' cannot substitute for '{}' of type '{}'",
                                    member, member_type, head, head_type
                                ),
                            )
                            .with_component(member.clone()),
                        );
                    }
                }
            }
        }
    }

    /// Each redefined group must reference the original or restrict it
    fn check_redefined_groups(&self, errors: &mut Vec<SchemaError>) {
        for entry in self.maps.groups.values() {
            let Some(group) = entry.built() else { continue };
            let Some(original) = &group.redefine else { continue };

            let self_reference = group
                .name
                .as_ref()
                .map(|name| group.references_group(name))
                .unwrap_or(false);

            if !self_reference && !is_valid_restriction(group, original, &self.maps, &self.limits) {
                errors.push(
                    SchemaError::new(
                        ErrorKind::RedefineNotRestriction,
                        format!(
                            "the redefined group '{}' is an illegal restriction of the original group",
                            group.name.as_ref().map(|n| n.to_string()).unwrap_or_default()
                        ),
                    )
                    .with_component(group.name.clone().unwrap_or_else(|| QName::local(""))),
                );
            }
        }
    }

    /// Restriction legality and model consistency of complex content
    fn check_complex_content_models(
        &self,
        errors: &mut Vec<SchemaError>,
        warnings: &mut Vec<String>,
    ) {
        for entry in self.maps.types.values() {
            let Some(XsdType::Complex(complex)) = entry.built() else {
                continue;
            };
            let Some(content) = complex.content_group() else {
                continue;
            };

            if complex.derivation == Some(DerivationMethod::Restriction) {
                if let Some(base_name) = &complex.base_type {
                    if base_name != &QName::xsd("anyType") {
                        if let Some(XsdType::Complex(base)) = self.maps.built_type(base_name) {
                            if let Some(base_content) = base.content_group() {
                                if !is_valid_restriction(
                                    content,
                                    base_content,
                                    &self.maps,
                                    &self.limits,
                                ) {
                                    errors.push(
                                        SchemaError::new(
                                            ErrorKind::ParticleRestriction,
                                            format!(
                                                "the derived group of '{}' is an illegal restriction of the base type group",
                                                complex
                                                    .name
                                                    .as_ref()
                                                    .map(|n| n.to_string())
                                                    .unwrap_or_default()
                                            ),
                                        )
                                        .with_component(
                                            complex
                                                .name
                                                .clone()
                                                .unwrap_or_else(|| QName::local("")),
                                        ),
                                    );
                                }
                            }
                        }
                    }
                }
            }

            let outcome = check_model(content, &self.maps, &self.limits);
            for mut err in outcome.errors {
                if err.component.is_none() {
                    if let Some(name) = &complex.name {
                        err = err.with_component(name.clone());
                    }
                }
                errors.push(err);
            }
            warnings.extend(outcome.warnings.into_iter().map(|w| {
                format!(
                    "cannot fully verify the content model of '{}': {}",
                    complex
                        .name
                        .as_ref()
                        .map(|n| n.to_string())
                        .unwrap_or_default(),
                    w
                )
            }));
        }
    }

    /// True when `derived` names a type that (transitively) derives from
    /// `ancestor`
    pub fn type_derives_from(&self, derived: &QName, ancestor: &QName) -> bool {
        if derived == ancestor {
            return true;
        }
        let mut seen: HashSet<QName> = HashSet::new();
        let mut current = derived.clone();
        loop {
            if !seen.insert(current.clone()) {
                return false; // derivation cycle, reported elsewhere
            }
            match self.maps.built_type(&current) {
                Some(XsdType::Simple(simple)) => return simple.is_derived_from(ancestor),
                Some(XsdType::Complex(complex)) => match &complex.base_type {
                    Some(base) if base == ancestor => return true,
                    Some(base) => current = base.clone(),
                    None => return false,
                },
                None => return false,
            }
        }
    }

    fn record_errors(&mut self, errors: Vec<SchemaError>) -> Result<()> {
        match self.validation {
            ValidationMode::Strict => match errors.into_iter().next() {
                Some(err) => Err(err.into()),
                None => Ok(()),
            },
            ValidationMode::Lax => {
                self.errors.extend(errors);
                Ok(())
            }
            ValidationMode::Skip => Ok(()),
        }
    }

    // ========== Produced artifact API ==========

    /// Look up a built component by kind and name
    pub fn lookup(&self, kind: ComponentKind, name: &QName) -> Result<ComponentRef<'_>> {
        self.maps.lookup(kind, name).map_err(Error::from)
    }

    /// Iterate all built global components
    pub fn iter_globals(&self) -> impl Iterator<Item = ComponentRef<'_>> {
        self.maps.iter_globals()
    }

    /// Iterate built components of one kind
    pub fn iter_components(
        &self,
        kind: ComponentKind,
    ) -> impl Iterator<Item = ComponentRef<'_>> + '_ {
        self.maps.iter_components(kind)
    }

    /// A namespace-scoped view over the built maps
    pub fn namespace_view<'a>(&'a self, namespace: Option<&'a str>) -> NamespaceView<'a> {
        NamespaceView {
            globals: self,
            namespace,
        }
    }

    /// The substitutes registered for a head element
    pub fn substitution_group(&self, head: &QName) -> Option<&[QName]> {
        self.substitution_groups.get(head).map(Vec::as_slice)
    }

    /// How much of the registered set was built
    pub fn validation_attempted(&self) -> ValidationAttempted {
        if self.built && self.maps.all_built() {
            ValidationAttempted::Full
        } else if self.maps.iter_globals().next().is_some() {
            ValidationAttempted::Partial
        } else {
            ValidationAttempted::None
        }
    }

    /// Validity of the built artifact
    pub fn validity(&self) -> Validity {
        if self.validation == ValidationMode::Skip || !self.built {
            return Validity::NotKnown;
        }
        if self.all_errors().is_empty() {
            Validity::Valid
        } else {
            Validity::Invalid
        }
    }

    /// All build errors: schema errors in registration order, then
    /// component errors in map order, then coordinator errors
    pub fn all_errors(&self) -> Vec<&SchemaError> {
        let mut out: Vec<&SchemaError> = Vec::new();
        for schema in &self.schemas {
            out.extend(schema.errors.iter());
        }
        for component in self.maps.iter_globals() {
            match component {
                ComponentRef::Notation(n) => out.extend(n.errors.iter()),
                ComponentRef::Type(t) => t.collect_errors(&mut out),
                ComponentRef::Attribute(a) => out.extend(a.errors.iter()),
                ComponentRef::AttributeGroup(g) => {
                    out.extend(g.errors.iter());
                    for attr in g.attributes.values() {
                        out.extend(attr.errors.iter());
                    }
                }
                ComponentRef::Group(g) => g.collect_errors(&mut out),
                ComponentRef::Element(e) => e.collect_errors(&mut out),
            }
        }
        out.extend(self.errors.iter());
        out
    }

    /// All accumulated warnings
    pub fn all_warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Discard every map entry and registered schema
    pub fn clear(&mut self) {
        self.maps.clear();
        self.schemas.clear();
        self.namespaces.clear();
        self.locations.clear();
        self.substitution_groups.clear();
        self.constraints.clear();
        self.errors.clear();
        self.warnings.clear();
        self.built = false;
        self.checked = false;
    }
}

/// A view over the global maps restricted to one target namespace
#[derive(Debug, Clone, Copy)]
pub struct NamespaceView<'a> {
    globals: &'a XsdGlobals,
    namespace: Option<&'a str>,
}

impl<'a> NamespaceView<'a> {
    fn in_namespace(&self, name: Option<&QName>) -> bool {
        name.map(|n| n.namespace() == self.namespace).unwrap_or(false)
    }

    /// Iterate the built types of this namespace
    pub fn types(&self) -> impl Iterator<Item = &'a XsdType> + '_ {
        self.globals
            .maps
            .types
            .values()
            .filter_map(super::global_maps::GlobalEntry::built)
            .filter(|t| self.in_namespace(t.name()))
    }

    /// Iterate the built elements of this namespace
    pub fn elements(&self) -> impl Iterator<Item = &'a super::elements::XsdElement> + '_ {
        self.globals
            .maps
            .elements
            .values()
            .filter_map(super::global_maps::GlobalEntry::built)
            .filter(|e| self.in_namespace(Some(&e.name)))
    }

    /// Iterate the built attributes of this namespace
    pub fn attributes(&self) -> impl Iterator<Item = &'a super::attributes::XsdAttribute> + '_ {
        self.globals
            .maps
            .attributes
            .values()
            .filter_map(super::global_maps::GlobalEntry::built)
            .filter(|a| self.in_namespace(Some(&a.name)))
    }

    /// Iterate the built groups of this namespace
    pub fn groups(&self) -> impl Iterator<Item = &'a XsdGroup> + '_ {
        self.globals
            .maps
            .groups
            .values()
            .filter_map(super::global_maps::GlobalEntry::built)
            .filter(|g| self.in_namespace(g.name.as_ref()))
    }

    /// Iterate the built attribute groups of this namespace
    pub fn attribute_groups(
        &self,
    ) -> impl Iterator<Item = &'a super::attributes::XsdAttributeGroup> + '_ {
        self.globals
            .maps
            .attribute_groups
            .values()
            .filter_map(super::global_maps::GlobalEntry::built)
            .filter(|g| self.in_namespace(g.name.as_ref()))
    }

    /// Iterate the built notations of this namespace
    pub fn notations(&self) -> impl Iterator<Item = &'a super::notations::XsdNotation> + '_ {
        self.globals
            .maps
            .notations
            .values()
            .filter_map(super::global_maps::GlobalEntry::built)
            .filter(|n| self.in_namespace(Some(&n.name)))
    }
}
