//! Resolution rule precedence: first matching rule wins.

use std::sync::Arc;

use j2x::hir::{ProjectIndex, ResolveRule, ResolvedName, Resolver, ScopeContext};
use j2x::syntax::{ImportDecl, SourceUnit, TypeDecl};
use rstest::rstest;

fn project() -> Vec<SourceUnit> {
    vec![
        SourceUnit::new("a/Outer.java", "a").with_type(
            TypeDecl::class("Outer")
                .with_nested(TypeDecl::class("Item").with_nested(TypeDecl::class("Detail"))),
        ),
        SourceUnit::new("a/Item.java", "a").with_type(TypeDecl::class("Item")),
        SourceUnit::new("b/Item.java", "b").with_type(TypeDecl::class("Item")),
        SourceUnit::new("c/Item.java", "c").with_type(TypeDecl::class("Item")),
        SourceUnit::new("c/Only.java", "c").with_type(TypeDecl::class("Only")),
        SourceUnit::new("d/String.java", "d").with_type(TypeDecl::class("Exception")),
    ]
}

fn user_unit() -> SourceUnit {
    SourceUnit::new("a/User.java", "a")
        .with_import(ImportDecl::single("b.Item"))
        .with_import(ImportDecl::wildcard("c"))
        .with_import(ImportDecl::wildcard("org.vendor"))
        .with_import(ImportDecl::single("org.lib.Widget"))
}

fn resolve(name: &str, chain: &[Arc<str>]) -> (ResolvedName, ResolveRule) {
    let units = project();
    let index = ProjectIndex::build(&units);
    let unit = user_unit();
    let scope = ScopeContext::for_unit(&index, &unit);
    Resolver::new(&scope).with_chain(chain).resolve_with_rule(name)
}

fn q(name: &str) -> ResolvedName {
    ResolvedName::Qualified(Arc::from(name))
}

#[test]
fn test_lexical_chain_beats_imports() {
    let chain: [Arc<str>; 1] = [Arc::from("a.Outer")];
    assert_eq!(
        resolve("Item", &chain),
        (q("a.Outer.Item"), ResolveRule::LexicalChain)
    );
}

#[test]
fn test_innermost_enclosing_type_first() {
    let chain: [Arc<str>; 2] = [Arc::from("a.Outer"), Arc::from("a.Outer.Item")];
    assert_eq!(
        resolve("Detail", &chain),
        (q("a.Outer.Item.Detail"), ResolveRule::LexicalChain)
    );
}

#[rstest]
#[case("Item", "b.Item", ResolveRule::ExplicitImport)]
#[case("Only", "c.Only", ResolveRule::Wildcard)]
#[case("Outer", "a.Outer", ResolveRule::SamePackage)]
#[case("c.Item", "c.Item", ResolveRule::Registry)]
#[case("Outer.Item.Detail", "a.Outer.Item.Detail", ResolveRule::DottedWalk)]
#[case("int", "int", ResolveRule::BuiltIn)]
#[case("String", "java.lang.String", ResolveRule::BuiltIn)]
#[case("java.lang.Integer", "java.lang.Integer", ResolveRule::BuiltIn)]
fn test_project_and_builtin_rules(
    #[case] name: &str,
    #[case] expected: &str,
    #[case] rule: ResolveRule,
) {
    assert_eq!(resolve(name, &[]), (q(expected), rule));
}

#[rstest]
#[case("Widget", "org.lib.Widget")]
#[case("Gadget", "org.vendor.Gadget")]
#[case("com.acme.Thing", "com.acme.Thing")]
fn test_external_guesses(#[case] name: &str, #[case] expected: &str) {
    let (resolved, rule) = resolve(name, &[]);
    assert_eq!(resolved, ResolvedName::ExternalStub(Arc::from(expected)));
    assert_eq!(rule, ResolveRule::ExternalGuess);
}

#[test]
fn test_java_lang_guess_yields_to_project_claim() {
    let units = project();
    let index = ProjectIndex::build(&units);
    // No wildcards, so the java.lang table is the only guess left.
    let scope = ScopeContext::new(&index, "z");
    let resolver = Resolver::new(&scope);
    assert_eq!(
        resolver.resolve("RuntimeException"),
        ResolvedName::ExternalStub(Arc::from("java.lang.RuntimeException"))
    );
    // d.Exception claims the simple name.
    assert!(resolver.resolve("Exception").is_unknown());
}

#[test]
fn test_unknown_keeps_original_text() {
    let units = project();
    let index = ProjectIndex::build(&units);
    let scope = ScopeContext::new(&index, "z");
    assert_eq!(
        Resolver::new(&scope).resolve_with_rule("Mystery"),
        (ResolvedName::Unknown(Arc::from("Mystery")), ResolveRule::Unknown)
    );
}

#[test]
fn test_import_of_non_project_type_is_not_qualified() {
    let units = project();
    let index = ProjectIndex::build(&units);
    let scope = ScopeContext::new(&index, "a").with_import("org.lib.Item");
    // Explicit import is skipped (not in the registry); same package wins.
    assert_eq!(
        Resolver::new(&scope).resolve_with_rule("Item"),
        (q("a.Item"), ResolveRule::SamePackage)
    );
}
