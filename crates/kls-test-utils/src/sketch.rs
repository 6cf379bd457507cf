use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kls_db::{
    AnalysisError, BindingContext, CompilationKind, Diagnostic, Frontend, SyntaxKey,
};
use kls_syntax::ast::{
    AstNode, BinaryExpression, Block, CallExpression, ClassDeclaration, DotQualifiedExpression,
    FunctionDeclaration, IfExpression, LiteralExpression, Parameter, ParenthesizedExpression,
    PrefixExpression, PropertyDeclaration, ReferenceExpression, ReturnExpression,
    SafeQualifiedExpression, SourceFile, TypeReference,
};
use kls_syntax::{ParsedFile, SyntaxKind, SyntaxNode, TextRange};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SketchType {
    Int,
    String,
    Boolean,
    Unit,
    Any,
    Null,
    Class(String),
    Nullable(Box<SketchType>),
}

impl SketchType {
    fn from_name(name: &str) -> Self {
        match name {
            "Int" => SketchType::Int,
            "String" => SketchType::String,
            "Boolean" => SketchType::Boolean,
            "Unit" => SketchType::Unit,
            "Any" => SketchType::Any,
            other => SketchType::Class(other.to_string()),
        }
    }

    fn is_builtin(name: &str) -> bool {
        matches!(name, "Int" | "String" | "Boolean" | "Unit" | "Any")
    }

    fn nullable(self) -> Self {
        match self {
            SketchType::Nullable(_) | SketchType::Null => self,
            other => SketchType::Nullable(Box::new(other)),
        }
    }

    fn non_null(&self) -> &SketchType {
        match self {
            SketchType::Nullable(inner) => inner,
            other => other,
        }
    }
}

impl fmt::Display for SketchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchType::Int => f.write_str("Int"),
            SketchType::String => f.write_str("String"),
            SketchType::Boolean => f.write_str("Boolean"),
            SketchType::Unit => f.write_str("Unit"),
            SketchType::Any => f.write_str("Any"),
            SketchType::Null => f.write_str("Nothing?"),
            SketchType::Class(name) => f.write_str(name),
            SketchType::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Function,
    Property,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SketchDeclaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub path: Arc<Path>,
    /// Range of the declared name.
    pub range: TextRange,
    /// Value type for properties and parameters, return type for functions,
    /// the class itself for classes.
    pub ty: Option<SketchType>,
    /// Enclosing class of a member.
    pub container: Option<String>,
}

#[derive(Debug, Default)]
struct ClassInfo {
    members: Vec<SketchDeclaration>,
}

/// Top-level declarations of a source path.
#[derive(Debug, Default)]
struct Globals {
    top_level: Vec<SketchDeclaration>,
    classes: HashMap<String, ClassInfo>,
}

impl Globals {
    fn member(&self, class: &str, name: &str) -> Option<&SketchDeclaration> {
        self.classes
            .get(class)?
            .members
            .iter()
            .find(|member| member.name == name)
    }
}

#[derive(Debug)]
struct ScopeData {
    parent: Option<SketchScope>,
    declarations: Vec<SketchDeclaration>,
    globals: Arc<Globals>,
}

/// Names visible at some point of a file.
#[derive(Debug, Clone)]
pub struct SketchScope {
    data: Arc<ScopeData>,
}

impl SketchScope {
    fn root(globals: Arc<Globals>) -> Self {
        let declarations = globals.top_level.clone();
        Self {
            data: Arc::new(ScopeData {
                parent: None,
                declarations,
                globals,
            }),
        }
    }

    fn child(&self, declarations: Vec<SketchDeclaration>) -> Self {
        Self {
            data: Arc::new(ScopeData {
                parent: Some(self.clone()),
                declarations,
                globals: Arc::clone(&self.data.globals),
            }),
        }
    }

    /// Innermost declaration named `name`.
    pub fn lookup(&self, name: &str) -> Option<&SketchDeclaration> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(found) = current
                .data
                .declarations
                .iter()
                .rev()
                .find(|declaration| declaration.name == name)
            {
                return Some(found);
            }
            scope = current.data.parent.as_ref();
        }
        None
    }

    /// Names declared directly in this scope.
    pub fn local_names(&self) -> Vec<&str> {
        self.data
            .declarations
            .iter()
            .map(|declaration| declaration.name.as_str())
            .collect()
    }

    fn globals(&self) -> &Globals {
        &self.data.globals
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchModule {
    pub kind: CompilationKind,
    pub files: Vec<PathBuf>,
}

/// Reference frontend used by the kls test suites.
#[derive(Debug, Default)]
pub struct SketchFrontend {
    parses: AtomicUsize,
    file_analyses: AtomicUsize,
    expression_analyses: AtomicUsize,
    analyzed_files: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    analysis_delay_ms: AtomicU64,
    fail_files: AtomicBool,
    fail_expressions: AtomicBool,
}

impl SketchFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }

    /// Number of `analyze_files` calls.
    pub fn file_analysis_count(&self) -> usize {
        self.file_analyses.load(Ordering::SeqCst)
    }

    /// Total number of files passed to `analyze_files`.
    pub fn analyzed_file_count(&self) -> usize {
        self.analyzed_files.load(Ordering::SeqCst)
    }

    pub fn expression_analysis_count(&self) -> usize {
        self.expression_analyses.load(Ordering::SeqCst)
    }

    /// Largest number of analyzer calls that were ever running at once.
    pub fn max_concurrent_analyses(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Makes every analyzer call sleep, to widen race windows in tests.
    pub fn set_analysis_delay(&self, delay: Duration) {
        self.analysis_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_file_analysis(&self, fail: bool) {
        self.fail_files.store(fail, Ordering::SeqCst);
    }

    pub fn fail_expression_analysis(&self, fail: bool) {
        self.fail_expressions.store(fail, Ordering::SeqCst);
    }

    fn enter(&self) -> ActiveAnalysis<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        let delay = self.analysis_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        ActiveAnalysis(self)
    }
}

struct ActiveAnalysis<'a>(&'a SketchFrontend);

impl Drop for ActiveAnalysis<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Frontend for SketchFrontend {
    type Type = SketchType;
    type Declaration = SketchDeclaration;
    type Scope = SketchScope;
    type Module = SketchModule;

    fn parse(&self, path: &Path, text: &str, _kind: CompilationKind) -> ParsedFile {
        self.parses.fetch_add(1, Ordering::SeqCst);
        ParsedFile::parse(path, text)
    }

    fn analyze_files(
        &self,
        files: &[Arc<ParsedFile>],
        source_path: &[Arc<ParsedFile>],
        kind: CompilationKind,
    ) -> Result<(BindingContext<Self>, Self::Module), AnalysisError> {
        let _active = self.enter();
        self.file_analyses.fetch_add(1, Ordering::SeqCst);
        self.analyzed_files.fetch_add(files.len(), Ordering::SeqCst);
        if self.fail_files.load(Ordering::SeqCst) {
            return Err(AnalysisError::new("file analysis disabled"));
        }

        let globals = Arc::new(collect_globals(source_path));
        let root = SketchScope::root(globals);
        let mut context = BindingContext::new();
        for file in files {
            Analyzer::new(file.path(), &mut context).file(file, &root);
        }

        let module = SketchModule {
            kind,
            files: files.iter().map(|file| file.path().to_path_buf()).collect(),
        };
        Ok((context, module))
    }

    fn analyze_expression(
        &self,
        file: &ParsedFile,
        expression: &SyntaxNode,
        scope: &Self::Scope,
        _source_path: &[Arc<ParsedFile>],
        _kind: CompilationKind,
    ) -> Result<BindingContext<Self>, AnalysisError> {
        let _active = self.enter();
        self.expression_analyses.fetch_add(1, Ordering::SeqCst);
        if self.fail_expressions.load(Ordering::SeqCst) {
            return Err(AnalysisError::new("expression analysis disabled"));
        }

        let mut context = BindingContext::new();
        let mut analyzer = Analyzer::new(file.path(), &mut context);
        if expression.kind().is_declaration() {
            analyzer.local_declaration(expression, scope);
        } else if let Some(type_ref) = TypeReference::cast(expression.clone()) {
            analyzer.type_reference(&type_ref, scope);
        } else {
            analyzer.expression(expression, scope);
        }
        Ok(context)
    }
}

fn collect_globals(source_path: &[Arc<ParsedFile>]) -> Globals {
    let mut globals = Globals::default();
    let class_names: HashSet<String> = source_path
        .iter()
        .filter_map(|file| SourceFile::cast(file.syntax()))
        .flat_map(|file| file.declarations().collect::<Vec<_>>())
        .filter_map(ClassDeclaration::cast)
        .filter_map(|class| class.name().map(|name| name.text().to_string()))
        .collect();

    for file in source_path {
        let Some(source) = SourceFile::cast(file.syntax()) else {
            continue;
        };
        let path = file.path();
        for node in source.declarations() {
            if let Some(class) = ClassDeclaration::cast(node.clone()) {
                let Some(declaration) = class_declaration(path, &class) else {
                    continue;
                };
                let name = declaration.name.clone();
                if !globals.classes.contains_key(&name) {
                    let members = class_members(path, &class, &class_names);
                    globals.classes.insert(name, ClassInfo { members });
                }
                globals.top_level.push(declaration);
            } else if let Some(declaration) = member_declaration(path, &node, &class_names, None) {
                globals.top_level.push(declaration);
            }
        }
    }
    globals
}

fn class_declaration(path: &Arc<Path>, class: &ClassDeclaration) -> Option<SketchDeclaration> {
    let name = class.name()?;
    Some(SketchDeclaration {
        kind: DeclarationKind::Class,
        name: name.text().to_string(),
        path: Arc::clone(path),
        range: name.text_range(),
        ty: Some(SketchType::Class(name.text().to_string())),
        container: None,
    })
}

fn class_members(
    path: &Arc<Path>,
    class: &ClassDeclaration,
    classes: &HashSet<String>,
) -> Vec<SketchDeclaration> {
    let owner = class.name().map(|name| name.text().to_string());
    let mut members: Vec<SketchDeclaration> = class
        .parameters()
        .filter(Parameter::has_val_or_var)
        .filter_map(|parameter| {
            let mut declaration = parameter_declaration(path, &parameter)?;
            declaration.kind = DeclarationKind::Property;
            declaration.container = owner.clone();
            Some(declaration)
        })
        .collect();
    members.extend(
        class
            .members()
            .filter_map(|node| member_declaration(path, &node, classes, owner.clone())),
    );
    members
}

fn member_declaration(
    path: &Arc<Path>,
    node: &SyntaxNode,
    classes: &HashSet<String>,
    container: Option<String>,
) -> Option<SketchDeclaration> {
    if let Some(function) = FunctionDeclaration::cast(node.clone()) {
        let name = function.name()?;
        let ty = match function.return_type() {
            Some(type_ref) => Some(declared_type(&type_ref)),
            None if function.has_expression_body() => {
                function.body().and_then(|body| shallow_type(&body, classes))
            }
            None => Some(SketchType::Unit),
        };
        return Some(SketchDeclaration {
            kind: DeclarationKind::Function,
            name: name.text().to_string(),
            path: Arc::clone(path),
            range: name.text_range(),
            ty,
            container,
        });
    }

    let property = PropertyDeclaration::cast(node.clone())?;
    let name = property.name()?;
    let ty = match property.type_reference() {
        Some(type_ref) => Some(declared_type(&type_ref)),
        None => property
            .initializer()
            .and_then(|init| shallow_type(&init, classes)),
    };
    Some(SketchDeclaration {
        kind: DeclarationKind::Property,
        name: name.text().to_string(),
        path: Arc::clone(path),
        range: name.text_range(),
        ty,
        container,
    })
}

fn parameter_declaration(path: &Arc<Path>, parameter: &Parameter) -> Option<SketchDeclaration> {
    let name = parameter.name()?;
    Some(SketchDeclaration {
        kind: DeclarationKind::Parameter,
        name: name.text().to_string(),
        path: Arc::clone(path),
        range: name.text_range(),
        ty: parameter.type_reference().map(|type_ref| declared_type(&type_ref)),
        container: None,
    })
}

fn declared_type(type_ref: &TypeReference) -> SketchType {
    let ty = SketchType::from_name(&type_ref.name_text());
    if type_ref.is_nullable() {
        ty.nullable()
    } else {
        ty
    }
}

fn literal_type(literal: &LiteralExpression) -> Option<SketchType> {
    Some(match literal.token()?.kind() {
        SyntaxKind::IntLiteral => SketchType::Int,
        SyntaxKind::StringLiteral => SketchType::String,
        SyntaxKind::TrueKw | SyntaxKind::FalseKw => SketchType::Boolean,
        SyntaxKind::NullKw => SketchType::Null,
        _ => return None,
    })
}

/// Types that can be read off an initializer without resolving names:
/// literals and constructor calls.
fn shallow_type(expression: &SyntaxNode, classes: &HashSet<String>) -> Option<SketchType> {
    match expression.kind() {
        SyntaxKind::LiteralExpression => literal_type(&LiteralExpression::cast(expression.clone())?),
        SyntaxKind::ParenthesizedExpression => {
            shallow_type(&ParenthesizedExpression::cast(expression.clone())?.expression()?, classes)
        }
        SyntaxKind::CallExpression => {
            let callee = CallExpression::cast(expression.clone())?.callee()?;
            let name = ReferenceExpression::cast(callee)?.name()?;
            classes
                .contains(name.text())
                .then(|| SketchType::Class(name.text().to_string()))
        }
        _ => None,
    }
}

struct Analyzer<'a> {
    path: &'a Arc<Path>,
    context: &'a mut BindingContext<SketchFrontend>,
}

impl<'a> Analyzer<'a> {
    fn new(path: &'a Arc<Path>, context: &'a mut BindingContext<SketchFrontend>) -> Self {
        Self { path, context }
    }

    fn key(&self, node: &SyntaxNode) -> SyntaxKey {
        SyntaxKey::of(self.path, node)
    }

    fn file(&mut self, file: &ParsedFile, root: &SketchScope) {
        for error in file.errors() {
            self.context.push_diagnostic(Diagnostic::error(
                Arc::clone(self.path),
                error.range,
                error.message.clone(),
            ));
        }

        let syntax = file.syntax();
        self.context.record_scope(self.key(&syntax), root.clone());
        let Some(source) = SourceFile::cast(syntax) else {
            return;
        };
        for node in source.declarations() {
            self.declaration(&node, root);
        }
    }

    fn declaration(&mut self, node: &SyntaxNode, scope: &SketchScope) {
        match node.kind() {
            SyntaxKind::ClassDeclaration => {
                if let Some(class) = ClassDeclaration::cast(node.clone()) {
                    self.class(&class, scope);
                }
            }
            SyntaxKind::FunctionDeclaration => {
                if let Some(function) = FunctionDeclaration::cast(node.clone()) {
                    self.function(&function, scope);
                }
            }
            SyntaxKind::PropertyDeclaration => {
                if let Some(property) = PropertyDeclaration::cast(node.clone()) {
                    self.property(&property, scope);
                }
            }
            _ => {}
        }
    }

    fn class(&mut self, class: &ClassDeclaration, scope: &SketchScope) {
        for parameter in class.parameters() {
            self.parameter(&parameter, scope);
        }
        let members = class
            .name()
            .and_then(|name| scope.globals().classes.get(name.text()))
            .map(|info| info.members.clone())
            .unwrap_or_default();
        let class_scope = scope.child(members);
        self.context
            .record_scope(self.key(class.syntax()), class_scope.clone());
        for member in class.members() {
            self.declaration(&member, &class_scope);
        }
    }

    fn function(&mut self, function: &FunctionDeclaration, scope: &SketchScope) {
        let mut parameters = Vec::new();
        for parameter in function.parameters() {
            self.parameter(&parameter, scope);
            parameters.extend(parameter_declaration(self.path, &parameter));
        }
        if let Some(type_ref) = function.return_type() {
            self.type_reference(&type_ref, scope);
        }
        let function_scope = scope.child(parameters);
        self.context
            .record_scope(self.key(function.syntax()), function_scope.clone());
        if let Some(body) = function.body() {
            self.expression(&body, &function_scope);
        }
    }

    fn parameter(&mut self, parameter: &Parameter, scope: &SketchScope) {
        if let Some(type_ref) = parameter.type_reference() {
            self.type_reference(&type_ref, scope);
        }
        if let Some(default) = parameter.default_value() {
            self.expression(&default, scope);
        }
    }

    /// Analyzes a property and returns its declaration.
    fn property(&mut self, property: &PropertyDeclaration, scope: &SketchScope) -> Option<SketchDeclaration> {
        let declared = property.type_reference().map(|type_ref| {
            self.type_reference(&type_ref, scope);
            declared_type(&type_ref)
        });
        let inferred = property
            .initializer()
            .and_then(|init| self.expression(&init, scope));
        let name = property.name()?;
        Some(SketchDeclaration {
            kind: DeclarationKind::Property,
            name: name.text().to_string(),
            path: Arc::clone(self.path),
            range: name.text_range(),
            ty: declared.or(inferred),
            container: None,
        })
    }

    /// A declaration analyzed on its own, as recovered fragments are.
    fn local_declaration(&mut self, node: &SyntaxNode, scope: &SketchScope) {
        let ty = if let Some(parameter) = Parameter::cast(node.clone()) {
            self.parameter(&parameter, scope);
            parameter.type_reference().map(|type_ref| declared_type(&type_ref))
        } else if let Some(property) = PropertyDeclaration::cast(node.clone()) {
            self.property(&property, scope).and_then(|declaration| declaration.ty)
        } else {
            self.declaration(node, scope);
            None
        };
        if let Some(ty) = ty {
            self.context.record_type(self.key(node), ty);
        }
    }

    fn type_reference(&mut self, type_ref: &TypeReference, scope: &SketchScope) {
        let name = type_ref.name_text();
        if SketchType::is_builtin(&name) {
            return;
        }
        match scope.lookup(&name).filter(|d| d.kind == DeclarationKind::Class) {
            Some(class) => {
                let class = class.clone();
                self.context.record_reference(self.key(type_ref.syntax()), class);
            }
            None => self.unresolved(type_ref.syntax(), &name),
        }
    }

    fn unresolved(&mut self, node: &SyntaxNode, name: &str) {
        self.context.push_diagnostic(Diagnostic::error(
            Arc::clone(self.path),
            node.text_range(),
            format!("Unresolved reference: {name}"),
        ));
    }

    fn expression(&mut self, node: &SyntaxNode, scope: &SketchScope) -> Option<SketchType> {
        let ty = self.infer(node, scope);
        if let Some(ty) = &ty {
            self.context.record_type(self.key(node), ty.clone());
        }
        ty
    }

    fn infer(&mut self, node: &SyntaxNode, scope: &SketchScope) -> Option<SketchType> {
        match node.kind() {
            SyntaxKind::LiteralExpression => literal_type(&LiteralExpression::cast(node.clone())?),
            SyntaxKind::ReferenceExpression => {
                let declaration = self.reference(node, scope)?;
                match declaration.kind {
                    DeclarationKind::Function => None,
                    _ => declaration.ty,
                }
            }
            SyntaxKind::ParenthesizedExpression => {
                let inner = ParenthesizedExpression::cast(node.clone())?.expression()?;
                self.expression(&inner, scope)
            }
            SyntaxKind::PrefixExpression => {
                let prefix = PrefixExpression::cast(node.clone())?;
                let operand = prefix
                    .operand()
                    .and_then(|operand| self.expression(&operand, scope));
                match prefix.op()?.kind() {
                    SyntaxKind::Bang => Some(SketchType::Boolean),
                    _ => operand,
                }
            }
            SyntaxKind::BinaryExpression => self.binary(&BinaryExpression::cast(node.clone())?, scope),
            SyntaxKind::IfExpression => {
                let if_expr = IfExpression::cast(node.clone())?;
                if let Some(condition) = if_expr.condition() {
                    self.expression(&condition, scope);
                }
                let then_ty = if_expr
                    .then_branch()
                    .and_then(|branch| self.expression(&branch, scope));
                let else_ty = if_expr
                    .else_branch()
                    .and_then(|branch| self.expression(&branch, scope));
                match (then_ty, else_ty) {
                    (Some(a), Some(b)) if a == b => Some(a),
                    (Some(_), Some(_)) => Some(SketchType::Any),
                    _ => None,
                }
            }
            SyntaxKind::Block => self.block(&Block::cast(node.clone())?, scope),
            SyntaxKind::ReturnExpression => {
                if let Some(value) = ReturnExpression::cast(node.clone())?.value() {
                    self.expression(&value, scope);
                }
                None
            }
            SyntaxKind::CallExpression => self.call(&CallExpression::cast(node.clone())?, None, scope),
            SyntaxKind::DotQualifiedExpression => {
                let dot = DotQualifiedExpression::cast(node.clone())?;
                let receiver = self.expression(&dot.receiver()?, scope)?;
                self.member(&dot.selector()?, &receiver, scope)
            }
            SyntaxKind::SafeQualifiedExpression => {
                let safe = SafeQualifiedExpression::cast(node.clone())?;
                let receiver = self.expression(&safe.receiver()?, scope)?;
                let receiver = receiver.non_null().clone();
                self.member(&safe.selector()?, &receiver, scope)
                    .map(SketchType::nullable)
            }
            _ => None,
        }
    }

    fn binary(&mut self, binary: &BinaryExpression, scope: &SketchScope) -> Option<SketchType> {
        let lhs = binary.lhs().and_then(|lhs| self.expression(&lhs, scope));
        let rhs = binary.rhs().and_then(|rhs| self.expression(&rhs, scope));
        match binary.op()?.kind() {
            SyntaxKind::EqEq
            | SyntaxKind::BangEq
            | SyntaxKind::Less
            | SyntaxKind::Greater
            | SyntaxKind::LessEq
            | SyntaxKind::GreaterEq
            | SyntaxKind::AmpAmp
            | SyntaxKind::PipePipe => Some(SketchType::Boolean),
            SyntaxKind::Plus
                if lhs == Some(SketchType::String) || rhs == Some(SketchType::String) =>
            {
                Some(SketchType::String)
            }
            _ => lhs,
        }
    }

    fn block(&mut self, block: &Block, scope: &SketchScope) -> Option<SketchType> {
        let mut locals = Vec::new();
        let mut current = scope.child(Vec::new());
        let mut last = Some(SketchType::Unit);
        for statement in block.statements() {
            if let Some(property) = PropertyDeclaration::cast(statement.clone()) {
                if let Some(local) = self.property(&property, &current) {
                    locals.push(local.clone());
                    current = current.child(vec![local]);
                }
                last = Some(SketchType::Unit);
            } else if statement.kind().is_declaration() {
                self.declaration(&statement, &current);
                last = Some(SketchType::Unit);
            } else {
                last = self.expression(&statement, &current);
            }
        }
        self.context
            .record_scope(self.key(block.syntax()), scope.child(locals));
        last
    }

    /// A call, optionally on a receiver of type `receiver`.
    fn call(
        &mut self,
        call: &CallExpression,
        receiver: Option<&SketchType>,
        scope: &SketchScope,
    ) -> Option<SketchType> {
        for argument in call.arguments() {
            self.expression(&argument, scope);
        }
        let callee = call.callee()?;
        let Some(reference) = ReferenceExpression::cast(callee.clone()) else {
            self.expression(&callee, scope);
            return None;
        };
        let declaration = match receiver {
            Some(receiver) => self.member_reference(&reference, receiver, scope)?,
            None => self.reference(reference.syntax(), scope)?,
        };
        match declaration.kind {
            DeclarationKind::Function | DeclarationKind::Class => declaration.ty,
            _ => None,
        }
    }

    fn member(
        &mut self,
        selector: &SyntaxNode,
        receiver: &SketchType,
        scope: &SketchScope,
    ) -> Option<SketchType> {
        if let Some(call) = CallExpression::cast(selector.clone()) {
            let ty = self.call(&call, Some(receiver), scope);
            if let Some(ty) = &ty {
                self.context.record_type(self.key(selector), ty.clone());
            }
            return ty;
        }
        let reference = ReferenceExpression::cast(selector.clone())?;
        let ty = self.member_reference(&reference, receiver, scope)?.ty;
        if let Some(ty) = &ty {
            self.context.record_type(self.key(selector), ty.clone());
        }
        ty
    }

    fn member_reference(
        &mut self,
        reference: &ReferenceExpression,
        receiver: &SketchType,
        scope: &SketchScope,
    ) -> Option<SketchDeclaration> {
        let name = reference.name()?;
        let SketchType::Class(class) = receiver else {
            if *receiver == SketchType::String && name.text() == "length" {
                return Some(SketchDeclaration {
                    kind: DeclarationKind::Property,
                    name: "length".to_string(),
                    path: Arc::from(Path::new("kotlin/String.kt")),
                    range: TextRange::default(),
                    ty: Some(SketchType::Int),
                    container: Some("String".to_string()),
                });
            }
            self.unresolved(reference.syntax(), name.text());
            return None;
        };
        match scope.globals().member(class, name.text()) {
            Some(member) => {
                let member = member.clone();
                self.context
                    .record_reference(self.key(reference.syntax()), member.clone());
                Some(member)
            }
            None => {
                self.unresolved(reference.syntax(), name.text());
                None
            }
        }
    }

    fn reference(&mut self, node: &SyntaxNode, scope: &SketchScope) -> Option<SketchDeclaration> {
        let name = ReferenceExpression::cast(node.clone())?.name()?;
        match scope.lookup(name.text()) {
            Some(declaration) => {
                let declaration = declaration.clone();
                self.context
                    .record_reference(self.key(node), declaration.clone());
                Some(declaration)
            }
            None => {
                self.unresolved(node, name.text());
                None
            }
        }
    }
}
