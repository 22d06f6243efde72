//! Integration tests for lowering C++ class definitions into a class graph.

use overrider_common::SourceFile;
use overrider_frontend_cpp::{parse_file, LoweredFile};
use overrider_model::{Access, MethodSignature, RecordKind, SemanticModel, TypeNode};

fn lower(code: &str) -> LoweredFile {
    let file = SourceFile::detached("test.cpp", code);
    parse_file(&file).expect("lowering failed")
}

fn class<'g>(lowered: &'g LoweredFile, name: &str) -> &'g TypeNode {
    lowered
        .graph
        .type_by_name(name)
        .unwrap_or_else(|| panic!("class {name} not found"))
}

fn methods<'g>(lowered: &'g LoweredFile, ty: &TypeNode) -> Vec<&'g MethodSignature> {
    ty.methods
        .iter()
        .map(|&m| lowered.graph.method(m).unwrap())
        .collect()
}

#[test]
fn test_records_and_bases() {
    let lowered = lower(
        r#"
class Base {};
struct Mixin {};
class Derived : public Base, private virtual Mixin, Unknown {};
struct Plain : Base {};
"#,
    );
    assert_eq!(lowered.graph.len(), 4);

    let derived = class(&lowered, "Derived");
    assert_eq!(derived.kind, RecordKind::Class);
    assert_eq!(derived.bases.len(), 3);
    assert_eq!(derived.bases[0].spelled, "Base");
    assert_eq!(derived.bases[0].access, Access::Public);
    assert!(!derived.bases[0].is_virtual);
    assert_eq!(derived.bases[1].access, Access::Private);
    assert!(derived.bases[1].is_virtual);
    // No access written in a class: private.
    assert_eq!(derived.bases[2].access, Access::Private);
    assert_eq!(derived.bases[2].resolved, None);

    let base = class(&lowered, "Base");
    assert_eq!(derived.bases[0].resolved, Some(base.id));

    let plain = class(&lowered, "Plain");
    assert_eq!(plain.kind, RecordKind::Struct);
    assert_eq!(plain.bases[0].access, Access::Public);
}

#[test]
fn test_forward_declarations_are_ignored() {
    let lowered = lower("class Later;\nclass Later { };\n");
    assert_eq!(lowered.graph.len(), 1);
}

#[test]
fn test_method_flags() {
    let lowered = lower(
        r#"
class Base {
public:
  virtual void Pure() = 0;
  virtual int Get() const = 0;
  virtual void Impl() {}
  void Plain();
  static int Count();
};
"#,
    );
    let base = class(&lowered, "Base");
    let ms = methods(&lowered, base);
    let names: Vec<&str> = ms.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["Pure", "Get", "Impl", "Plain", "Count"]);

    assert!(ms[0].is_pure && ms[0].is_virtual && !ms[0].is_const);
    assert!(ms[1].is_pure && ms[1].is_const);
    assert_eq!(ms[1].return_type, "int");
    assert!(ms[2].is_virtual && !ms[2].is_pure);
    assert!(!ms[3].is_virtual && !ms[3].is_pure);
    assert!(!ms[4].is_virtual);
    assert!(base.is_abstract);
}

#[test]
fn test_constructors_and_destructors_are_not_methods() {
    let lowered = lower(
        r#"
class Base {
public:
  Base();
  virtual ~Base() {}
  virtual void Run() = 0;
};
"#,
    );
    let base = class(&lowered, "Base");
    let names: Vec<String> = methods(&lowered, base)
        .iter()
        .map(|m| m.name.to_string())
        .collect();
    assert_eq!(names, ["Run"]);
}

#[test]
fn test_parameter_and_return_types() {
    let lowered = lower(
        r#"
class Api {
public:
  virtual const std::string& Name(int id, const int& ref, char** argv, int) const = 0;
  virtual unsigned   int Size(void) = 0;
  virtual int* Data(std::map<int,int> m, int const& rhs) = 0;
};
"#,
    );
    let api = class(&lowered, "Api");
    let ms = methods(&lowered, api);

    assert_eq!(ms[0].return_type, "const std::string &");
    let params: Vec<String> = ms[0].params.iter().map(|p| p.to_string()).collect();
    assert_eq!(params, ["int id", "const int & ref", "char ** argv", "int"]);

    assert_eq!(ms[1].return_type, "unsigned int");
    assert!(ms[1].params.is_empty());

    assert_eq!(ms[2].return_type, "int *");
    assert_eq!(ms[2].params[0].ty, "std::map<int, int>");
    assert_eq!(ms[2].params[1].ty, "const int &");
}

#[test]
fn test_override_edges_from_source() {
    let lowered = lower(
        r#"
class Base {
public:
  virtual void F(int x) = 0;
  virtual void G() const = 0;
};
class Derived : public Base {
public:
  void F(int y) override;
  void G();
};
"#,
    );
    let base = class(&lowered, "Base");
    let derived = class(&lowered, "Derived");
    let base_methods = methods(&lowered, base);
    let derived_methods = methods(&lowered, derived);

    assert_eq!(derived_methods[0].overrides, vec![base_methods[0].id]);
    // Missing const: a new function, not an override.
    assert!(derived_methods[1].overrides.is_empty());
    assert!(derived.is_abstract);
}

#[test]
fn test_anchors() {
    let code = "class Derived : public Base {\npublic:\n  int x;\nprotected:\n};\n";
    let lowered = lower(code);
    let derived = class(&lowered, "Derived");
    let anchors = &derived.anchors;

    assert_eq!(anchors.open_brace, Some(code.find('{').unwrap() as u32));
    assert_eq!(anchors.close_brace, Some(code.rfind('}').unwrap() as u32));
    assert_eq!(anchors.access_sections.len(), 2);
    assert_eq!(anchors.access_sections[0].access, Access::Public);
    assert_eq!(anchors.access_sections[0].colon, code.find("public:").unwrap() as u32 + 6);
    assert_eq!(anchors.access_sections[1].access, Access::Protected);
    assert_eq!(anchors.access_sections[1].colon, code.find("protected:").unwrap() as u32 + 9);

    assert!(anchors.header.contains(code.find("Derived").unwrap() as u32));
    assert!(!anchors.header.contains(code.find("int x").unwrap() as u32));
}

#[test]
fn test_namespaces_and_nested_classes() {
    let lowered = lower(
        r#"
namespace outer {
namespace inner {
class Shape { public: virtual double Area() const = 0; };
}
class Holder {
  class Nested : public inner::Shape {};
};
}
"#,
    );
    let shape = class(&lowered, "outer::inner::Shape");
    assert_eq!(shape.name, "Shape");
    let nested = class(&lowered, "outer::Holder::Nested");
    assert_eq!(nested.bases[0].resolved, Some(shape.id));
    assert!(nested.is_abstract);
}

#[test]
fn test_type_at_offset_picks_header() {
    let code = "class A {};\nclass B : public A {};\n";
    let lowered = lower(code);
    let b = lowered.graph.type_at_offset(code.find("B :").unwrap() as u32).unwrap();
    assert_eq!(b.name, "B");
    assert!(lowered.graph.type_at_offset(code.len() as u32).is_none());
}

#[test]
fn test_syntax_errors_are_reported_not_fatal() {
    let lowered = lower(
        r#"
class Base { public: virtual void F() = 0; };
int broken( {
class Derived : public Base { public: };
"#,
    );
    assert!(!lowered.diagnostics.is_empty());
    assert!(lowered.graph.type_by_name("Base").is_some());
}

fn long_sum(terms: usize) -> String {
    vec!["1"; terms].join(" + ")
}

#[test]
fn test_deep_expression_in_function_body() {
    let code = format!(
        "class Base {{ public: virtual void F() = 0; }};\n\
         class Derived : public Base {{ public: }};\n\
         int g() {{ return {}; }}\n",
        long_sum(100_000)
    );
    let lowered = lower(&code);
    assert!(lowered.diagnostics.is_empty());
    assert_eq!(lowered.graph.len(), 2);
    assert!(class(&lowered, "Derived").is_abstract);
}

#[test]
fn test_deep_initializer_at_namespace_scope() {
    let code = format!(
        "namespace n {{ const int total = {}; class Shape {{ public: virtual int Sides() const = 0; }}; }}\n",
        long_sum(100_000)
    );
    let lowered = lower(&code);
    assert!(class(&lowered, "n::Shape").is_abstract);
}

#[test]
fn test_records_inside_guards_and_linkage_blocks() {
    let lowered = lower(
        r#"
#ifndef SHAPES_H
#define SHAPES_H
extern "C++" {
class Shape { public: virtual double Area() const = 0; };
}
typedef struct Point { int x; } Point;
void helper() { class Local : public Shape {}; }
#endif
"#,
    );
    assert!(class(&lowered, "Shape").is_abstract);
    assert!(lowered.graph.type_by_name("Point").is_some());
    // Function bodies are not indexed.
    assert!(lowered.graph.type_by_name("Local").is_none());
}
