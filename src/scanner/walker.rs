//! Syntax-tree walk collecting scanner facts.

use super::{DependencyKey, FieldWrite, KeyedCall, MethodDecl, SourceUnit, TypeDecl, Visibility};
use std::path::Path;
use tree_sitter::Node;

/// Collect facts from a parsed file
pub(super) fn extract(root: Node, source: &str, path: &Path) -> SourceUnit {
    let mut walker = Walker {
        source: source.as_bytes(),
        unit: SourceUnit::empty(path),
        namespaces: Vec::new(),
        open_types: Vec::new(),
        method: None,
        singleton_depth: 0,
        forced_visibility: None,
    };
    walker.visit(root);
    walker.unit
}

struct OpenType {
    index: usize,
    default_visibility: Visibility,
    /// `private :name` style overrides, applied when the body closes
    overrides: Vec<(String, Visibility)>,
    /// Attribute writers with the visibility in force where they were declared
    writers: Vec<(String, Visibility)>,
}

struct MethodContext {
    name: String,
    singleton: bool,
}

struct Walker<'a> {
    source: &'a [u8],
    unit: SourceUnit,
    namespaces: Vec<String>,
    open_types: Vec<OpenType>,
    method: Option<MethodContext>,
    singleton_depth: usize,
    forced_visibility: Option<Visibility>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "class" | "module" => self.visit_type(node),
            "singleton_class" => {
                self.singleton_depth += 1;
                self.visit_children(node);
                self.singleton_depth -= 1;
            }
            "method" => self.visit_method(node, false),
            "singleton_method" => self.visit_method(node, true),
            "assignment" | "operator_assignment" => {
                self.record_assignment(node);
                self.visit_children(node);
            }
            "call" => self.visit_call(node),
            "identifier" => self.visit_identifier(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        for i in 0..node.child_count() {
            if let Some(child) = node.child(i) {
                self.visit(child);
            }
        }
    }

    fn current_owner(&self) -> Option<String> {
        self.open_types
            .last()
            .map(|t| self.unit.types[t.index].qualified_name.clone())
    }

    fn visit_type(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        let written = self.text(name_node);
        let qualified = match (written.strip_prefix("::"), self.namespaces.last()) {
            (Some(absolute), _) => absolute.to_string(),
            (None, Some(outer)) => format!("{outer}::{written}"),
            (None, None) => written.to_string(),
        };
        let name = qualified
            .rsplit("::")
            .next()
            .unwrap_or(qualified.as_str())
            .to_string();
        let superclass = node
            .child_by_field_name("superclass")
            .and_then(|s| s.named_child(0))
            .and_then(|expr| self.leading_constant(expr));

        self.unit.types.push(TypeDecl {
            qualified_name: qualified.clone(),
            name,
            lexical_scopes: self.namespaces.clone(),
            superclass,
            is_module: node.kind() == "module",
            line: node.start_position().row + 1,
            methods: Vec::new(),
            abstract_operations: Vec::new(),
            attr_writers: Vec::new(),
        });
        self.namespaces.push(qualified);
        self.open_types.push(OpenType {
            index: self.unit.types.len() - 1,
            default_visibility: Visibility::Public,
            overrides: Vec::new(),
            writers: Vec::new(),
        });
        let outer_method = self.method.take();
        let outer_singleton = std::mem::take(&mut self.singleton_depth);

        if let Some(body) = node.child_by_field_name("body") {
            self.visit(body);
        } else {
            for i in 0..node.child_count() {
                match node.child(i) {
                    Some(child) if child.id() != name_node.id() => self.visit(child),
                    _ => {}
                }
            }
        }

        self.singleton_depth = outer_singleton;
        self.method = outer_method;
        self.namespaces.pop();
        if let Some(open) = self.open_types.pop() {
            self.close_type(open);
        }
    }

    fn close_type(&mut self, open: OpenType) {
        let decl = &mut self.unit.types[open.index];
        for (name, visibility) in &open.overrides {
            for method in decl.methods.iter_mut().filter(|m| &m.name == name) {
                method.visibility = *visibility;
            }
        }
        for (name, visibility) in open.writers {
            let setter = format!("{name}=");
            let overridden = open
                .overrides
                .iter()
                .rev()
                .find(|(n, _)| *n == setter)
                .map(|(_, v)| *v);
            if overridden.unwrap_or(visibility) == Visibility::Public {
                decl.attr_writers.push(name);
            }
        }
    }

    fn visit_method(&mut self, node: Node, singleton_def: bool) {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let singleton = singleton_def || self.singleton_depth > 0;
        let forced = self.forced_visibility.take();

        if let Some(open) = self.open_types.last() {
            let visibility = if singleton {
                Visibility::Public
            } else {
                forced.unwrap_or(open.default_visibility)
            };
            let constant_defaults = node
                .child_by_field_name("parameters")
                .map(|params| self.constant_defaults(params))
                .unwrap_or_default();
            let index = open.index;
            self.unit.types[index].methods.push(MethodDecl {
                name: name.clone(),
                singleton,
                visibility,
                line: node.start_position().row + 1,
                constant_defaults,
            });
        }

        let outer = self.method.replace(MethodContext { name, singleton });
        self.visit_children(node);
        self.method = outer;
    }

    fn constant_defaults(&self, params: Node) -> Vec<(String, String)> {
        let mut defaults = Vec::new();
        for i in 0..params.named_child_count() {
            let Some(param) = params.named_child(i) else {
                continue;
            };
            if !matches!(param.kind(), "keyword_parameter" | "optional_parameter") {
                continue;
            }
            let name = param.child_by_field_name("name").map(|n| self.text(n));
            let value = param
                .child_by_field_name("value")
                .and_then(|v| self.leading_constant(v));
            if let (Some(name), Some(value)) = (name, value) {
                defaults.push((name.to_string(), value));
            }
        }
        defaults
    }

    fn record_assignment(&mut self, node: Node) {
        let Some(left) = node.child_by_field_name("left") else {
            return;
        };
        let targets: Vec<Node> = match left.kind() {
            "instance_variable" => vec![left],
            "left_assignment_list" => instance_variables_in(left),
            _ => Vec::new(),
        };
        let value_constant = if node.kind() == "assignment" && targets.len() == 1 {
            node.child_by_field_name("right")
                .and_then(|r| self.leading_constant(r))
        } else {
            None
        };

        let owner = self.current_owner();
        for target in targets {
            self.unit.field_writes.push(FieldWrite {
                variable: self.text(target).to_string(),
                line: target.start_position().row + 1,
                owner: owner.clone(),
                method: self.method.as_ref().map(|m| m.name.clone()),
                singleton: self.method.as_ref().is_some_and(|m| m.singleton),
                value_constant: value_constant.clone(),
            });
        }
    }

    fn visit_identifier(&mut self, node: Node) {
        let in_body = node
            .parent()
            .is_some_and(|p| matches!(p.kind(), "body_statement" | "class" | "module"));
        if !in_body || self.method.is_some() || self.singleton_depth > 0 {
            return;
        }
        if let Some(visibility) = Visibility::from_keyword(self.text(node)) {
            if let Some(open) = self.open_types.last_mut() {
                open.default_visibility = visibility;
            }
        }
    }

    fn visit_call(&mut self, node: Node) {
        let method = node
            .child_by_field_name("method")
            .map(|m| self.text(m))
            .unwrap_or("");
        let has_receiver = node.child_by_field_name("receiver").is_some();
        let args: Vec<Node> = node
            .child_by_field_name("arguments")
            .map(named_children)
            .unwrap_or_default();

        if let Some(key) = args.first().and_then(|a| self.literal_key(*a)) {
            self.unit.keyed_calls.push(KeyedCall {
                method: method.to_string(),
                key,
                line: node.start_position().row + 1,
                owner: self.current_owner(),
            });
        }

        if !has_receiver && self.method.is_none() && !self.open_types.is_empty() {
            self.type_body_macro(method, &args);
        }

        if !has_receiver && self.method.is_none() {
            if let Some(visibility) = Visibility::from_keyword(method) {
                if args.is_empty() {
                    if let Some(open) = self.open_types.last_mut() {
                        open.default_visibility = visibility;
                    }
                } else {
                    self.forced_visibility = Some(visibility);
                }
            }
        }

        self.visit_children(node);
        self.forced_visibility = None;
    }

    /// Class-body macros: visibility with names, attribute writers, abstract operations
    fn type_body_macro(&mut self, method: &str, args: &[Node]) {
        let symbols: Vec<String> = args
            .iter()
            .filter_map(|a| self.literal_key(*a))
            .map(|k| k.as_str().to_string())
            .collect();
        let forced = self.forced_visibility;
        let Some(open) = self.open_types.last_mut() else {
            return;
        };

        match method {
            "attr_writer" | "attr_accessor" => {
                let visibility = forced.unwrap_or(open.default_visibility);
                open.writers
                    .extend(symbols.into_iter().map(|name| (name, visibility)));
            }
            "abstract_method" => {
                let index = open.index;
                self.unit.types[index].abstract_operations.extend(symbols);
            }
            _ => {
                if let Some(visibility) = Visibility::from_keyword(method) {
                    open.overrides
                        .extend(symbols.into_iter().map(|name| (name, visibility)));
                }
            }
        }
    }

    /// Literal symbol or string argument
    fn literal_key(&self, node: Node) -> Option<DependencyKey> {
        match node.kind() {
            "simple_symbol" => {
                let text = self.text(node).trim_start_matches(':');
                Some(DependencyKey::Symbol(text.to_string()))
            }
            "delimited_symbol" => self.string_literal(node).map(DependencyKey::Symbol),
            "string" => self.string_literal(node).map(DependencyKey::Str),
            _ => None,
        }
    }

    /// Content of a string without interpolation
    fn string_literal(&self, node: Node) -> Option<String> {
        let mut content = String::new();
        for part in named_children(node) {
            if part.kind() != "string_content" {
                return None;
            }
            content.push_str(self.text(part));
        }
        Some(content)
    }

    /// Constant at the head of an expression: `Foo::Bar.new(x)` -> `Foo::Bar`.
    /// A leading `::` is kept so resolution skips the lexical scopes.
    fn leading_constant(&self, node: Node) -> Option<String> {
        match node.kind() {
            "constant" | "scope_resolution" => Some(self.text(node).to_string()),
            "call" => node
                .child_by_field_name("receiver")
                .and_then(|r| self.leading_constant(r)),
            _ => None,
        }
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut children = Vec::new();
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            children.push(child);
        }
    }
    children
}

fn instance_variables_in(node: Node) -> Vec<Node> {
    let mut found = Vec::new();
    for child in named_children(node) {
        match child.kind() {
            "instance_variable" => found.push(child),
            "rest_assignment" | "destructured_left_assignment" => {
                found.extend(instance_variables_in(child))
            }
            _ => {}
        }
    }
    found
}
