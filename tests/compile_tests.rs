//! End-to-end schema compilation tests
//!
//! Each test compiles one or more in-memory schema documents and checks
//! the produced component graph.

use pretty_assertions::assert_eq;

use xsd_compiler::resources::{DenyAllLoader, InMemoryLoader};
use xsd_compiler::validators::{
    AttributeUse, ElementType, FacetKind, GroupParticle, ModelType, SchemaComponent,
    SimpleTypeKind, SimpleVariety, XsdType,
};
use xsd_compiler::{
    ComponentKind, Error, ErrorCategory, ErrorKind, QName, ValidationMode, Validity, XsdGlobals,
    XsdVersion,
};

const TNS: &str = "urn:test";

fn q(local: &str) -> QName {
    QName::namespaced(TNS, local)
}

fn wrap(body: &str) -> String {
    format!(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:tns="{}" targetNamespace="{}">{}</xs:schema>"#,
        TNS, TNS, body
    )
}

fn compile(body: &str) -> XsdGlobals {
    let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Strict);
    globals.add_schema(&wrap(body), &DenyAllLoader).unwrap();
    globals.build().unwrap();
    globals
}

fn compile_lax(body: &str) -> XsdGlobals {
    let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Lax);
    globals.add_schema(&wrap(body), &DenyAllLoader).unwrap();
    globals.build().unwrap();
    globals
}

fn compile_set(root: &str, sources: &[(&str, &str)], mode: ValidationMode) -> XsdGlobals {
    let mut loader = InMemoryLoader::new();
    for (location, source) in sources {
        loader = loader.add(*location, *source);
    }
    let mut globals = XsdGlobals::new(XsdVersion::V10, mode);
    globals.add_schema(root, &loader).unwrap();
    globals.build().unwrap();
    globals
}

fn error_kinds(globals: &XsdGlobals) -> Vec<ErrorKind> {
    globals.all_errors().iter().map(|e| e.kind).collect()
}

// ===== E1: element with a built-in type =====

#[test]
fn e1_element_with_builtin_type() {
    let globals = compile(r#"<xs:element name="a" type="xs:string"/>"#);

    let element = globals.maps.built_element(&q("a")).unwrap();
    assert_eq!(element.type_name(), Some(&QName::xsd("string")));
    assert!(element.is_global());
    assert_eq!(globals.validity(), Validity::Valid);
}

// ===== E2: facets of a simple type restriction =====

#[test]
fn e2_restriction_facets() {
    let globals = compile(
        r#"<xs:simpleType name="T">
             <xs:restriction base="xs:int">
               <xs:minInclusive value="0"/>
               <xs:maxInclusive value="10"/>
             </xs:restriction>
           </xs:simpleType>"#,
    );

    let simple = globals.maps.built_type(&q("T")).unwrap().as_simple().unwrap();
    assert_eq!(simple.facets.value(FacetKind::MinInclusive), Some("0"));
    assert_eq!(simple.facets.value(FacetKind::MaxInclusive), Some("10"));

    match &simple.kind {
        SimpleTypeKind::Restriction { base } => {
            assert_eq!(base.name.as_ref(), Some(&QName::xsd("int")));
        }
        other => panic!("unexpected kind: {:?}", other),
    }
    assert_eq!(simple.variety(), SimpleVariety::Atomic);
    // Facets inherited from xs:int's chain stay in force
    assert_eq!(simple.facets.value(FacetKind::FractionDigits), Some("0"));
}

// ===== E3: complex content extension concatenates the base =====

#[test]
fn e3_extension_prefixes_base_content() {
    let globals = compile(
        r#"<xs:complexType name="B">
             <xs:sequence><xs:element name="x" type="xs:int"/></xs:sequence>
           </xs:complexType>
           <xs:complexType name="D">
             <xs:complexContent>
               <xs:extension base="tns:B">
                 <xs:sequence><xs:element name="y" type="xs:int"/></xs:sequence>
               </xs:extension>
             </xs:complexContent>
           </xs:complexType>"#,
    );

    let base = globals.maps.built_type(&q("B")).unwrap().as_complex().unwrap();
    let derived = globals.maps.built_type(&q("D")).unwrap().as_complex().unwrap();

    let content = derived.content_group().unwrap();
    assert_eq!(content.model, ModelType::Sequence);
    assert_eq!(content.particles.len(), 2);

    // The first particle is B's content group
    match &content.particles[0] {
        GroupParticle::Group(prefix) => {
            assert_eq!(prefix.as_ref(), base.content_group().unwrap());
        }
        other => panic!("unexpected particle: {:?}", other),
    }
    // The second holds the extension's own element
    match &content.particles[1] {
        GroupParticle::Group(own) => match &own.particles[0] {
            GroupParticle::Element(e) => assert_eq!(e.name.local_name, "y"),
            other => panic!("unexpected particle: {:?}", other),
        },
        other => panic!("unexpected particle: {:?}", other),
    }
}

// ===== Property 3: extension preserves base attributes =====

#[test]
fn extension_attributes_are_superset_of_base() {
    let globals = compile(
        r#"<xs:complexType name="B">
             <xs:sequence/>
             <xs:attribute name="b1" type="xs:string" use="required"/>
           </xs:complexType>
           <xs:complexType name="D">
             <xs:complexContent>
               <xs:extension base="tns:B">
                 <xs:attribute name="d1" type="xs:int"/>
               </xs:extension>
             </xs:complexContent>
           </xs:complexType>"#,
    );

    let derived = globals.maps.built_type(&q("D")).unwrap().as_complex().unwrap();
    let b1 = derived.attributes.get(&QName::local("b1")).unwrap();
    assert_eq!(b1.use_, AttributeUse::Required);
    assert!(derived.attributes.get(&QName::local("d1")).is_some());
    assert_eq!(derived.attributes.len(), 2);
}

// ===== E4: substitution groups =====

#[test]
fn e4_substitution_group_membership() {
    let globals = compile(
        r#"<xs:element name="a" type="xs:string"/>
           <xs:element name="b" substitutionGroup="tns:a" type="xs:string"/>"#,
    );

    let members = globals.substitution_group(&q("a")).unwrap();
    assert_eq!(members, [q("b")]);

    let member = globals.maps.built_element(&q("b")).unwrap();
    assert_eq!(member.substitution_group.as_ref(), Some(&q("a")));
}

// ===== E5: include plus redefine of a group =====

const LIB_WITH_GROUP: &str = r#"
    <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
               xmlns:tns="urn:test" targetNamespace="urn:test">
      <xs:group name="G">
        <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
      </xs:group>
    </xs:schema>"#;

#[test]
fn e5_redefined_group_keeps_original() {
    let root = wrap(
        r#"<xs:redefine schemaLocation="lib.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let globals = compile_set(&root, &[("lib.xsd", LIB_WITH_GROUP)], ValidationMode::Strict);

    let group = globals.maps.built_group(&q("G")).unwrap();
    let original = group.redefine.as_ref().expect("redefine snapshot missing");
    assert_eq!(original.redefine, None);
    assert_eq!(original.particles.len(), 1);
    assert_eq!(group.particles.len(), 1);
    assert_eq!(globals.validity(), Validity::Valid);
}

// ===== Property 6: redefinition chain length =====

#[test]
fn redefinition_chain_follows_registration_order() {
    let root = wrap(
        r#"<xs:redefine schemaLocation="b.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let b = wrap(
        r#"<xs:redefine schemaLocation="c.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let c = wrap(
        r#"<xs:group name="G">
             <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
           </xs:group>"#,
    );

    let globals = compile_set(
        &root,
        &[("b.xsd", b.as_str()), ("c.xsd", c.as_str())],
        ValidationMode::Strict,
    );

    // Two redefining documents: a two-deep snapshot chain
    let group = globals.maps.built_group(&q("G")).unwrap();
    let first = group.redefine.as_ref().unwrap();
    let second = first.redefine.as_ref().unwrap();
    assert_eq!(second.redefine, None);
}

// ===== E6: circular derivation falls back in lax mode =====

#[test]
fn e6_circular_derivation_reports_and_recovers() {
    let globals = compile_lax(
        r#"<xs:simpleType name="T1">
             <xs:restriction base="tns:T2"/>
           </xs:simpleType>
           <xs:simpleType name="T2">
             <xs:restriction base="tns:T1"/>
           </xs:simpleType>"#,
    );

    let kinds = error_kinds(&globals);
    assert!(kinds.contains(&ErrorKind::CircularDerivation));
    assert!(globals
        .all_errors()
        .iter()
        .any(|e| e.category() == ErrorCategory::Derivation));

    // Both types are built, grounded on the anySimpleType fallback
    let t1 = globals.maps.built_type(&q("T1")).unwrap().as_simple().unwrap();
    let t2 = globals.maps.built_type(&q("T2")).unwrap().as_simple().unwrap();
    assert!(t1.is_derived_from(&QName::xsd("anySimpleType")));
    assert!(t2.is_derived_from(&QName::xsd("anySimpleType")));
    assert_eq!(globals.validity(), Validity::Invalid);
}

// ===== Property 1: registered globals are found by lookup =====

#[test]
fn lookup_returns_registered_components() {
    let globals = compile(
        r#"<xs:notation name="n" public="pub"/>
           <xs:simpleType name="T"><xs:restriction base="xs:string"/></xs:simpleType>
           <xs:attribute name="att" type="xs:string"/>
           <xs:attributeGroup name="ag">
             <xs:attribute name="inner" type="xs:int"/>
           </xs:attributeGroup>
           <xs:group name="g">
             <xs:sequence><xs:element name="e" type="xs:string"/></xs:sequence>
           </xs:group>
           <xs:element name="el" type="tns:T"/>"#,
    );

    for (kind, local) in [
        (ComponentKind::Notation, "n"),
        (ComponentKind::Type, "T"),
        (ComponentKind::Attribute, "att"),
        (ComponentKind::AttributeGroup, "ag"),
        (ComponentKind::Group, "g"),
        (ComponentKind::Element, "el"),
    ] {
        let component = globals.lookup(kind, &q(local)).unwrap();
        assert_eq!(component.kind(), kind);
        assert_eq!(component.name(), Some(&q(local)));
    }
}

// ===== Property 2: simple type variants are well-formed =====

#[test]
fn simple_type_variants_are_well_formed() {
    let globals = compile(
        r#"<xs:simpleType name="R"><xs:restriction base="xs:string"/></xs:simpleType>
           <xs:simpleType name="L"><xs:list itemType="xs:int"/></xs:simpleType>
           <xs:simpleType name="U"><xs:union memberTypes="xs:int xs:string"/></xs:simpleType>
           <xs:simpleType name="LU"><xs:list itemType="tns:U"/></xs:simpleType>"#,
    );

    for typ in globals.namespace_view(Some(TNS)).types() {
        let simple = match typ {
            XsdType::Simple(s) => s,
            XsdType::Complex(_) => panic!("unexpected complex type"),
        };
        match &simple.kind {
            SimpleTypeKind::Atomic { .. } => {}
            SimpleTypeKind::Restriction { base } => assert!(base.is_atomic()),
            SimpleTypeKind::List { item } => assert!(item.is_valid_list_item()),
            SimpleTypeKind::Union { members } => assert!(!members.is_empty()),
        }
    }
}

// ===== Property 4: all-group constraints under XSD 1.0 =====

#[test]
fn all_group_members_are_single_elements() {
    let globals = compile(
        r#"<xs:complexType name="A">
             <xs:all>
               <xs:element name="x" type="xs:int"/>
               <xs:element name="y" type="xs:int" minOccurs="0"/>
             </xs:all>
           </xs:complexType>"#,
    );

    let content = globals
        .maps
        .built_type(&q("A"))
        .unwrap()
        .as_complex()
        .unwrap()
        .content_group()
        .unwrap();
    assert_eq!(content.model, ModelType::All);
    assert!(content.occurs.is_single());
    for particle in &content.particles {
        match particle {
            GroupParticle::Element(e) => assert!(matches!(e.occurs.max, Some(0) | Some(1))),
            other => panic!("unexpected particle in all group: {:?}", other),
        }
    }
}

#[test]
fn all_group_misuse_is_reported() {
    let globals = compile_lax(
        r#"<xs:complexType name="A">
             <xs:all>
               <xs:element name="x" type="xs:int" maxOccurs="2"/>
             </xs:all>
           </xs:complexType>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::AllGroupMisuse));
}

// ===== Property 5: derivation and substitution are acyclic =====

#[test]
fn derivation_is_acyclic_after_successful_build() {
    let globals = compile(
        r#"<xs:complexType name="B">
             <xs:sequence><xs:element name="x" type="xs:int"/></xs:sequence>
           </xs:complexType>
           <xs:complexType name="D">
             <xs:complexContent>
               <xs:extension base="tns:B">
                 <xs:sequence/>
               </xs:extension>
             </xs:complexContent>
           </xs:complexType>"#,
    );

    assert!(globals.type_derives_from(&q("D"), &q("B")));
    assert!(!globals.type_derives_from(&q("B"), &q("D")));
}

#[test]
fn substitution_cycle_is_reported() {
    let globals = compile_lax(
        r#"<xs:element name="a" type="xs:string" substitutionGroup="tns:b"/>
           <xs:element name="b" type="xs:string" substitutionGroup="tns:a"/>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::SubstitutionCycle));
}

// ===== Property 7: chameleon inclusion =====

#[test]
fn chameleon_include_adopts_target_namespace() {
    const CHAMELEON: &str = r#"
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
          <xs:simpleType name="IncT">
            <xs:restriction base="xs:string"/>
          </xs:simpleType>
          <xs:element name="inc" type="IncT"/>
        </xs:schema>"#;

    let root = wrap(r#"<xs:include schemaLocation="lib.xsd"/>"#);
    let globals = compile_set(&root, &[("lib.xsd", CHAMELEON)], ValidationMode::Strict);

    // Components land in the including namespace
    let element = globals.maps.built_element(&q("inc")).unwrap();
    assert_eq!(element.name, q("inc"));
    // The unqualified internal reference resolved into the adopted namespace
    assert_eq!(element.type_name(), Some(&q("IncT")));
    assert!(globals.maps.built_type(&q("IncT")).is_some());

    let included = &globals.schemas()[1];
    assert!(included.is_chameleon());
    assert_eq!(included.target_namespace.as_deref(), Some(TNS));
    assert_eq!(included.declared_namespace, None);
}

// ===== Property 8: missing vs wrong-kind lookups =====

#[test]
fn lookup_failures_are_categorized() {
    let globals = compile(r#"<xs:element name="a" type="xs:string"/>"#);

    match globals.lookup(ComponentKind::Element, &q("zzz")) {
        Err(Error::Schema(err)) => {
            assert_eq!(err.kind, ErrorKind::MissingComponent);
            assert_eq!(err.category(), ErrorCategory::Reference);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    match globals.lookup(ComponentKind::Type, &q("a")) {
        Err(Error::Schema(err)) => {
            assert_eq!(err.kind, ErrorKind::WrongKind);
            assert_eq!(err.category(), ErrorCategory::Reference);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

// ===== Round-trip and idempotence =====

#[test]
fn rebuilding_is_a_no_op() {
    let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Strict);
    globals
        .add_schema(
            &wrap(r#"<xs:element name="a" type="xs:string"/>"#),
            &DenyAllLoader,
        )
        .unwrap();
    globals.build().unwrap();

    let components = globals.maps.len();
    let errors = globals.all_errors().len();
    globals.build().unwrap();
    assert_eq!(globals.maps.len(), components);
    assert_eq!(globals.all_errors().len(), errors);
}

#[test]
fn cloned_coordinator_builds_an_equal_graph() {
    let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Strict);
    globals
        .add_schema(
            &wrap(
                r#"<xs:complexType name="B">
                     <xs:sequence><xs:element name="x" type="xs:int"/></xs:sequence>
                   </xs:complexType>
                   <xs:element name="root" type="tns:B"/>"#,
            ),
            &DenyAllLoader,
        )
        .unwrap();

    let mut copy = globals.clone();
    globals.build().unwrap();
    copy.build().unwrap();

    assert_eq!(globals.maps.len(), copy.maps.len());
    assert_eq!(
        globals.maps.built_type(&q("B")).unwrap(),
        copy.maps.built_type(&q("B")).unwrap()
    );
    assert_eq!(
        globals.maps.built_element(&q("root")).unwrap(),
        copy.maps.built_element(&q("root")).unwrap()
    );
}

// ===== Boundary behaviors =====

#[test]
fn empty_union_is_a_structural_error() {
    let globals = compile_lax(r#"<xs:simpleType name="U"><xs:union/></xs:simpleType>"#);
    let errors = globals.all_errors();
    assert!(errors.iter().any(|e| e.kind == ErrorKind::MissingUnionMembers));
    assert!(errors
        .iter()
        .any(|e| e.category() == ErrorCategory::Structural));
}

#[test]
fn empty_list_is_a_structural_error() {
    let globals = compile_lax(r#"<xs:simpleType name="L"><xs:list/></xs:simpleType>"#);
    assert!(error_kinds(&globals).contains(&ErrorKind::MissingAttribute));
}

#[test]
fn restriction_without_base_is_a_structural_error() {
    let globals = compile_lax(r#"<xs:simpleType name="R"><xs:restriction/></xs:simpleType>"#);
    assert!(error_kinds(&globals).contains(&ErrorKind::MissingAttribute));
}

#[test]
fn inverted_occurrence_bounds_are_a_structural_error() {
    let globals = compile_lax(
        r#"<xs:complexType name="C">
             <xs:sequence>
               <xs:element name="x" type="xs:int" minOccurs="3" maxOccurs="2"/>
             </xs:sequence>
           </xs:complexType>"#,
    );
    let errors = globals.all_errors();
    assert!(errors.iter().any(|e| e.kind == ErrorKind::InvalidOccurs));
    assert!(errors
        .iter()
        .any(|e| e.category() == ErrorCategory::Structural));
}

#[test]
fn duplicate_facets_are_reported() {
    let globals = compile_lax(
        r#"<xs:simpleType name="T">
             <xs:restriction base="xs:string">
               <xs:minLength value="1"/>
               <xs:minLength value="2"/>
             </xs:restriction>
           </xs:simpleType>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::DuplicateFacet));
}

#[test]
fn attributes_after_wildcard_are_reported() {
    let globals = compile_lax(
        r#"<xs:attributeGroup name="ag">
             <xs:anyAttribute/>
             <xs:attribute name="late" type="xs:string"/>
           </xs:attributeGroup>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::AttributesAfterWildcard));
}

#[test]
fn multiple_redefinition_is_reported() {
    let a = wrap(
        r#"<xs:redefine schemaLocation="lib.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let b = wrap(
        r#"<xs:redefine schemaLocation="lib.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let root = wrap(
        r#"<xs:include schemaLocation="a.xsd"/>
           <xs:include schemaLocation="b.xsd"/>"#,
    );

    let globals = compile_set(
        &root,
        &[
            ("a.xsd", a.as_str()),
            ("b.xsd", b.as_str()),
            ("lib.xsd", LIB_WITH_GROUP),
        ],
        ValidationMode::Lax,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::MultipleRedefinition));
}

#[test]
fn circular_redefinition_is_reported() {
    let a = wrap(
        r#"<xs:group name="G">
             <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
           </xs:group>
           <xs:redefine schemaLocation="b.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let b = wrap(
        r#"<xs:redefine schemaLocation="a.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="x" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:redefine>"#,
    );
    let root = wrap(r#"<xs:include schemaLocation="a.xsd"/>"#);

    let globals = compile_set(
        &root,
        &[("a.xsd", a.as_str()), ("b.xsd", b.as_str())],
        ValidationMode::Lax,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::CircularRedefinition));
}

// ===== Derivation legality =====

#[test]
fn valid_complex_restriction_narrows_occurrences() {
    let globals = compile(
        r#"<xs:complexType name="B">
             <xs:sequence>
               <xs:element name="x" type="xs:int" minOccurs="0" maxOccurs="unbounded"/>
             </xs:sequence>
           </xs:complexType>
           <xs:complexType name="R">
             <xs:complexContent>
               <xs:restriction base="tns:B">
                 <xs:sequence><xs:element name="x" type="xs:int"/></xs:sequence>
               </xs:restriction>
             </xs:complexContent>
           </xs:complexType>"#,
    );

    let restricted = globals.maps.built_type(&q("R")).unwrap().as_complex().unwrap();
    assert_eq!(restricted.content_group().unwrap().particles.len(), 1);
    assert_eq!(globals.validity(), Validity::Valid);
}

#[test]
fn illegal_complex_restriction_is_reported() {
    let globals = compile_lax(
        r#"<xs:complexType name="B">
             <xs:sequence><xs:element name="x" type="xs:int"/></xs:sequence>
           </xs:complexType>
           <xs:complexType name="R">
             <xs:complexContent>
               <xs:restriction base="tns:B">
                 <xs:sequence>
                   <xs:element name="x" type="xs:int"/>
                   <xs:element name="added" type="xs:int"/>
                 </xs:sequence>
               </xs:restriction>
             </xs:complexContent>
           </xs:complexType>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::ParticleRestriction));
}

#[test]
fn extension_of_all_group_is_rejected_in_xsd10() {
    let globals = compile_lax(
        r#"<xs:complexType name="B">
             <xs:all><xs:element name="x" type="xs:int"/></xs:all>
           </xs:complexType>
           <xs:complexType name="D">
             <xs:complexContent>
               <xs:extension base="tns:B">
                 <xs:sequence><xs:element name="y" type="xs:int"/></xs:sequence>
               </xs:extension>
             </xs:complexContent>
           </xs:complexType>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::IllegalExtension));
}

// ===== Strict mode aborts on the first error =====

#[test]
fn strict_mode_propagates_reference_errors() {
    let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Strict);
    globals
        .add_schema(
            &wrap(r#"<xs:element name="a" type="tns:nope"/>"#),
            &DenyAllLoader,
        )
        .unwrap();

    match globals.build() {
        Err(Error::Schema(err)) => assert_eq!(err.kind, ErrorKind::MissingComponent),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

// ===== Keyrefs and identity constraints =====

#[test]
fn keyref_refer_is_resolved_post_build() {
    let globals = compile(
        r#"<xs:element name="root">
             <xs:complexType>
               <xs:sequence>
                 <xs:element name="item" type="xs:string" maxOccurs="unbounded"/>
               </xs:sequence>
             </xs:complexType>
             <xs:key name="itemKey">
               <xs:selector xpath="item"/>
               <xs:field xpath="@id"/>
             </xs:key>
             <xs:keyref name="itemRef" refer="tns:itemKey">
               <xs:selector xpath="item"/>
               <xs:field xpath="@ref"/>
             </xs:keyref>
           </xs:element>"#,
    );

    assert!(globals.constraints.contains_key(&q("itemKey")));
    assert!(globals.constraints.contains_key(&q("itemRef")));
    assert_eq!(globals.validity(), Validity::Valid);
}

#[test]
fn dangling_keyref_is_reported() {
    let globals = compile_lax(
        r#"<xs:element name="root" type="xs:string">
             <xs:keyref name="r" refer="tns:missing">
               <xs:selector xpath="."/>
               <xs:field xpath="@x"/>
             </xs:keyref>
           </xs:element>"#,
    );
    assert!(error_kinds(&globals).contains(&ErrorKind::MissingComponent));
}

// ===== Recursive content models =====

#[test]
fn recursive_element_type_compiles() {
    let globals = compile(
        r#"<xs:complexType name="Tree">
             <xs:sequence>
               <xs:element name="node" type="tns:Tree" minOccurs="0" maxOccurs="unbounded"/>
             </xs:sequence>
           </xs:complexType>
           <xs:element name="tree" type="tns:Tree"/>"#,
    );

    let tree = globals.maps.built_type(&q("Tree")).unwrap().as_complex().unwrap();
    let content = tree.content_group().unwrap();
    match &content.particles[0] {
        GroupParticle::Element(e) => {
            assert_eq!(e.type_, ElementType::Named(q("Tree")));
        }
        other => panic!("unexpected particle: {:?}", other),
    }
    assert_eq!(globals.validity(), Validity::Valid);
}

#[test]
fn self_referential_group_through_optional_particle_compiles() {
    let globals = compile(
        r#"<xs:group name="Rec">
             <xs:sequence>
               <xs:element name="leaf" type="xs:string"/>
               <xs:group ref="tns:Rec" minOccurs="0"/>
             </xs:sequence>
           </xs:group>
           <xs:complexType name="Holder">
             <xs:group ref="tns:Rec"/>
           </xs:complexType>"#,
    );
    assert_eq!(globals.validity(), Validity::Valid);
}

// ===== XSD 1.1 surface =====

#[test]
fn override_requires_xsd11() {
    let root = wrap(
        r#"<xs:override schemaLocation="lib.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="y" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:override>"#,
    );
    let loader = InMemoryLoader::new().add("lib.xsd", LIB_WITH_GROUP);
    let mut globals = XsdGlobals::new(XsdVersion::V10, ValidationMode::Lax);
    globals.add_schema(&root, &loader).unwrap();
    globals.build().unwrap();
    assert!(error_kinds(&globals).contains(&ErrorKind::ForbiddenChild));
}

#[test]
fn override_replaces_components_in_xsd11() {
    let root = wrap(
        r#"<xs:override schemaLocation="lib.xsd">
             <xs:group name="G">
               <xs:sequence><xs:element name="y" type="xs:string"/></xs:sequence>
             </xs:group>
           </xs:override>"#,
    );
    let loader = InMemoryLoader::new().add("lib.xsd", LIB_WITH_GROUP);
    let mut globals = XsdGlobals::new(XsdVersion::V11, ValidationMode::Strict);
    globals.add_schema(&root, &loader).unwrap();
    globals.build().unwrap();

    let group = globals.maps.built_group(&q("G")).unwrap();
    match &group.particles[0] {
        GroupParticle::Element(e) => assert_eq!(e.name.local_name, "y"),
        other => panic!("unexpected particle: {:?}", other),
    }
}

#[test]
fn assertions_are_carried_in_xsd11() {
    let source = wrap(
        r#"<xs:complexType name="Measured">
             <xs:sequence><xs:element name="v" type="xs:int"/></xs:sequence>
             <xs:assert test="v ge 0"/>
           </xs:complexType>"#,
    );
    let mut globals = XsdGlobals::new(XsdVersion::V11, ValidationMode::Strict);
    globals.add_schema(&source, &DenyAllLoader).unwrap();
    globals.build().unwrap();

    let measured = globals.maps.built_type(&q("Measured")).unwrap().as_complex().unwrap();
    assert_eq!(measured.assertions.len(), 1);
    assert_eq!(measured.assertions[0].test, "v ge 0");
}

// ===== Imports =====

#[test]
fn import_resolves_cross_namespace_references() {
    const OTHER: &str = r#"
        <xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                   targetNamespace="urn:other">
          <xs:simpleType name="OtherT">
            <xs:restriction base="xs:string"/>
          </xs:simpleType>
        </xs:schema>"#;

    let root = format!(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                      xmlns:o="urn:other"
                      targetNamespace="{}">
             <xs:import namespace="urn:other" schemaLocation="other.xsd"/>
             <xs:element name="e" type="o:OtherT"/>
           </xs:schema>"#,
        TNS
    );

    let globals = compile_set(&root, &[("other.xsd", OTHER)], ValidationMode::Strict);
    let element = globals.maps.built_element(&q("e")).unwrap();
    assert_eq!(
        element.type_name(),
        Some(&QName::namespaced("urn:other", "OtherT"))
    );
}
