//! Static source scanner for Ruby implementation files.
//!
//! Parses one file at a time with tree-sitter and keeps only the structural
//! facts the conformance checks need:
//! - type declarations with their superclass, methods and visibility
//! - instance-variable writes with the enclosing type and method
//! - calls whose first argument is a literal symbol or string key

mod walker;

use crate::error::{ScanError, ScanResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Method visibility inside a type body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// A `def` inside a type body
#[derive(Debug, Clone, Serialize)]
pub struct MethodDecl {
    pub name: String,
    /// Defined on the type itself (`def self.x` or inside `class << self`)
    pub singleton: bool,
    pub visibility: Visibility,
    pub line: usize,
    /// Keyword or optional parameters whose default is a constant expression,
    /// as (parameter, constant) pairs
    pub constant_defaults: Vec<(String, String)>,
}

impl MethodDecl {
    /// Public instance method named `x=`
    pub fn is_public_setter(&self) -> bool {
        !self.singleton && self.visibility == Visibility::Public && is_setter_name(&self.name)
    }
}

/// Whether a method name assigns (`name=`, `[]=`) rather than compares
pub fn is_setter_name(name: &str) -> bool {
    name.ends_with('=') && !matches!(name, "==" | "!=" | "<=" | ">=" | "===")
}

/// A class or module declaration
#[derive(Debug, Clone, Serialize)]
pub struct TypeDecl {
    pub qualified_name: String,
    pub name: String,
    /// Enclosing namespaces, outermost first, used for constant lookup
    pub lexical_scopes: Vec<String>,
    /// Superclass as written, without resolution
    pub superclass: Option<String>,
    pub is_module: bool,
    pub line: usize,
    pub methods: Vec<MethodDecl>,
    /// Operations declared through `abstract_method :a, :b`
    pub abstract_operations: Vec<String>,
    /// Public `attr_writer`/`attr_accessor` names
    pub attr_writers: Vec<String>,
}

impl TypeDecl {
    /// Instance methods defined directly in this body
    pub fn instance_methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.methods.iter().filter(|m| !m.singleton)
    }

    pub fn defines(&self, method: &str) -> bool {
        self.instance_methods().any(|m| m.name == method)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.instance_methods().find(|m| m.name == name)
    }

    /// Public mutator names: public setters and attribute writers
    pub fn public_mutators(&self) -> Vec<String> {
        self.instance_methods()
            .filter(|m| m.is_public_setter())
            .map(|m| m.name.clone())
            .chain(self.attr_writers.iter().map(|w| format!("{w}=")))
            .collect()
    }
}

/// An instance-variable write (`=`, `||=`, `+=`, or multiple assignment)
#[derive(Debug, Clone, Serialize)]
pub struct FieldWrite {
    pub variable: String,
    pub line: usize,
    /// Qualified name of the enclosing type, if any
    pub owner: Option<String>,
    /// Enclosing method, `None` at type-body level
    pub method: Option<String>,
    pub singleton: bool,
    /// Leading constant of the assigned expression (`Foo::Bar.new` -> `Foo::Bar`)
    pub value_constant: Option<String>,
}

/// Literal key passed to a lookup or registration call
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DependencyKey {
    Symbol(String),
    Str(String),
}

impl DependencyKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Symbol(s) | Self::Str(s) => s,
        }
    }
}

impl std::fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, ":{s}"),
            Self::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// A call whose first argument is a literal key
#[derive(Debug, Clone, Serialize)]
pub struct KeyedCall {
    pub method: String,
    pub key: DependencyKey,
    pub line: usize,
    pub owner: Option<String>,
}

/// Facts extracted from one source file
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub types: Vec<TypeDecl>,
    pub field_writes: Vec<FieldWrite>,
    pub keyed_calls: Vec<KeyedCall>,
}

impl SourceUnit {
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn find_type(&self, qualified_name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.qualified_name == qualified_name)
    }
}

/// Instance-variable writes outside the designated constructor
pub fn mutations_outside_constructor<'a>(
    unit: &'a SourceUnit,
    constructor: &str,
) -> Vec<&'a FieldWrite> {
    unit.field_writes
        .iter()
        .filter(|w| w.singleton || w.method.as_deref() != Some(constructor))
        .collect()
}

/// Calls to `method` with a literal key, in source order
pub fn lookup_calls<'a>(unit: &'a SourceUnit, method: &str) -> Vec<&'a KeyedCall> {
    unit.keyed_calls.iter().filter(|c| c.method == method).collect()
}

/// A file whose facts could not be extracted
#[derive(Debug, Clone, Serialize)]
pub struct ScanDiagnostic {
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for ScanDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Result of scanning one file: facts, or empty facts and a diagnostic
#[derive(Debug, Clone)]
pub struct Scanned {
    pub unit: SourceUnit,
    pub diagnostic: Option<ScanDiagnostic>,
}

/// Reusable Ruby parser
pub struct SourceScanner {
    parser: tree_sitter::Parser,
}

impl SourceScanner {
    pub fn new() -> ScanResult<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_ruby::LANGUAGE.into())
            .map_err(|e| ScanError::ParserInit(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Extract facts from source text, failing if the text does not parse cleanly
    pub fn parse(&mut self, path: &Path, source: &str) -> ScanResult<SourceUnit> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ScanError::ParseDegradation(path.to_path_buf()))?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(ScanError::ParseDegradation(path.to_path_buf()));
        }
        Ok(walker::extract(root, source, path))
    }

    /// Scan a file, degrading to empty facts when it cannot be read or parsed
    pub fn scan_file(&mut self, path: &Path) -> Scanned {
        let result = std::fs::read_to_string(path)
            .map_err(ScanError::from)
            .and_then(|source| self.parse(path, &source));

        match result {
            Ok(unit) => Scanned {
                unit,
                diagnostic: None,
            },
            Err(e) => {
                tracing::warn!("Skipping static analysis of {}: {}", path.display(), e);
                Scanned {
                    unit: SourceUnit::empty(path),
                    diagnostic: Some(ScanDiagnostic {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(source: &str) -> SourceUnit {
        let mut scanner = SourceScanner::new().unwrap();
        scanner.parse(Path::new("sample.rb"), source).unwrap()
    }

    #[test]
    fn test_nested_class_and_superclass() {
        let unit = parse(
            "module CatContent\n  module Ports\n    class CatListingRepository < HexDDD::Ports::SecondaryPort\n      abstract_method :add, :find\n    end\n  end\nend\n",
        );
        let port = unit.find_type("CatContent::Ports::CatListingRepository").unwrap();
        assert_eq!(port.name, "CatListingRepository");
        assert_eq!(port.superclass.as_deref(), Some("HexDDD::Ports::SecondaryPort"));
        assert_eq!(port.line, 3);
        assert_eq!(port.lexical_scopes, vec!["CatContent", "CatContent::Ports"]);
        assert_eq!(port.abstract_operations, vec!["add", "find"]);
    }

    #[test]
    fn test_mutation_outside_constructor() {
        let unit = parse(
            "class Money\n  def initialize(amount)\n    @amount = amount\n  end\n\n  def bump!\n    @amount += 1\n    @cache ||= {}\n  end\nend\n",
        );
        let writes = mutations_outside_constructor(&unit, "initialize");
        let vars: Vec<_> = writes.iter().map(|w| (w.variable.as_str(), w.line)).collect();
        assert_eq!(vars, vec![("@amount", 7), ("@cache", 8)]);
        assert!(writes.iter().all(|w| w.owner.as_deref() == Some("Money")));
    }

    #[test]
    fn test_multiple_assignment_counts_each_field() {
        let unit = parse("class Pair\n  def swap\n    @a, @b = @b, @a\n  end\nend\n");
        let writes = mutations_outside_constructor(&unit, "initialize");
        assert_eq!(writes.len(), 2);
    }

    #[test]
    fn test_constructor_only_writes_are_clean() {
        let unit = parse("class Slug\n  def initialize(value)\n    @value = value.freeze\n  end\nend\n");
        assert!(mutations_outside_constructor(&unit, "initialize").is_empty());
    }

    #[test]
    fn test_public_mutators_respect_visibility() {
        let unit = parse(
            "class Profile\n  attr_accessor :nickname\n  attr_reader :name\n\n  def name=(value)\n  end\n\n  def ==(other)\n  end\n\n  private\n\n  def age=(value)\n  end\n\n  private def colour=(value)\n  end\nend\n",
        );
        let profile = unit.find_type("Profile").unwrap();
        let mut mutators = profile.public_mutators();
        mutators.sort();
        assert_eq!(mutators, vec!["name=", "nickname="]);
    }

    #[test]
    fn test_lookup_calls_extract_literal_keys() {
        let unit = parse(
            "class CatalogController < ActionController::API\n  def index\n    Wiring::Container.resolve(:cat_listing_service)\n    Container.resolve(\"cat_listing_repo\")\n    Container.resolve(key)\n  end\nend\n",
        );
        let calls = lookup_calls(&unit, "resolve");
        let keys: Vec<_> = calls.iter().map(|c| (c.key.clone(), c.line)).collect();
        assert_eq!(
            keys,
            vec![
                (DependencyKey::Symbol("cat_listing_service".to_string()), 3),
                (DependencyKey::Str("cat_listing_repo".to_string()), 4),
            ]
        );
        assert_eq!(calls[0].owner.as_deref(), Some("CatalogController"));
    }

    #[test]
    fn test_register_blocks_and_constant_defaults() {
        let unit = parse(
            "class Container\n  register(:cat_listing_repo) do\n    SqlRepo.new\n  end\nend\n\nclass SqlRepo < Ports::Repo\n  def initialize(mapper: Mappers::CatMapper.new, size: 3)\n    @mapper = mapper\n    @model = ::CatRecord\n  end\nend\n",
        );
        let registered = lookup_calls(&unit, "register");
        assert_eq!(registered[0].key.as_str(), "cat_listing_repo");

        let repo = unit.find_type("SqlRepo").unwrap();
        let ctor = repo.method("initialize").unwrap();
        assert_eq!(
            ctor.constant_defaults,
            vec![("mapper".to_string(), "Mappers::CatMapper".to_string())]
        );

        let model = unit
            .field_writes
            .iter()
            .find(|w| w.variable == "@model")
            .unwrap();
        assert_eq!(model.value_constant.as_deref(), Some("::CatRecord"));
    }

    #[test]
    fn test_absolute_superclass_keeps_root_marker() {
        let unit = parse("module Shop
  class Price < ::Base
  end
end
");
        let price = unit.find_type("Shop::Price").unwrap();
        assert_eq!(price.superclass.as_deref(), Some("::Base"));
    }

    #[test]
    fn test_singleton_methods_are_not_instance_methods() {
        let unit = parse(
            "class CatListing\n  def self.create(id:)\n    new(id: id)\n  end\n\n  class << self\n    def build\n    end\n  end\nend\n",
        );
        let listing = unit.find_type("CatListing").unwrap();
        assert_eq!(listing.methods.len(), 2);
        assert!(listing.instance_methods().next().is_none());
    }

    #[test]
    fn test_scan_file_degrades_on_syntax_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.rb");
        std::fs::write(&path, "class Broken\n  def oops(\nend\n").unwrap();

        let mut scanner = SourceScanner::new().unwrap();
        let scanned = scanner.scan_file(&path);
        assert!(scanned.unit.types.is_empty());
        assert!(scanned.unit.field_writes.is_empty());
        assert!(scanned.diagnostic.is_some());
    }

    #[test]
    fn test_setter_names() {
        assert!(is_setter_name("name="));
        assert!(is_setter_name("[]="));
        assert!(!is_setter_name("=="));
        assert!(!is_setter_name("<="));
        assert!(!is_setter_name("name"));
    }
}
