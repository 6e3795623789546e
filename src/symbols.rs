use std::any;
use std::fmt;

use crate::error::RunError;

/// What every recipe body returns. Any error type can be bubbled up with `?`.
pub type DemoResult = anyhow::Result<()>;

type Body = Box<dyn Fn(&[&str]) -> DemoResult>;

/// Last path segment of an item's type name, without generic arguments.
///
/// For a fn item this is the function's own name, which is how a recipe
/// can print "i'm test_sample" without repeating itself.
pub fn name_of<T: ?Sized>(_item: &T) -> &'static str {
    let full = any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

// =============================================================================
// Function
// =============================================================================

pub struct Function {
    name: String,
    arity: usize,
    body: Body,
}

impl Function {
    pub fn nullary<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> DemoResult + 'static,
    {
        Self {
            name: name.into(),
            arity: 0,
            body: Box::new(move |_: &[&str]| f()),
        }
    }

    pub fn with_arity<F>(name: impl Into<String>, arity: usize, f: F) -> Self
    where
        F: Fn(&[&str]) -> DemoResult + 'static,
    {
        Self {
            name: name.into(),
            arity,
            body: Box::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Checks the argument count, then runs the body.
    pub fn call(&self, args: &[&str]) -> Result<(), RunError> {
        if args.len() != self.arity {
            return Err(RunError::Arity {
                name: self.name.clone(),
                arity: self.arity,
                given: args.len(),
            });
        }
        (self.body)(args).map_err(|err| RunError::invocation(&self.name, err))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Symbol
// =============================================================================

/// A value bound to a name in a recipe module.
#[derive(Debug)]
pub enum Symbol {
    Function(Function),
    Value(String),
}

impl Symbol {
    pub fn is_callable(&self) -> bool {
        matches!(self, Symbol::Function(_))
    }

    /// Calls the symbol with no arguments, the way the runner does.
    pub fn invoke(&self, bound_as: &str) -> Result<(), RunError> {
        match self {
            Symbol::Function(func) => func.call(&[]),
            Symbol::Value(text) => Err(RunError::NotCallable {
                name: bound_as.to_string(),
                value: format!("{text:?}"),
            }),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Function(func) => write!(f, "<function {}>", func.name),
            Symbol::Value(text) => write!(f, "{text:?}"),
        }
    }
}

impl From<Function> for Symbol {
    fn from(func: Function) -> Self {
        Symbol::Function(func)
    }
}

// =============================================================================
// SymbolTable
// =============================================================================

/// Ordered name -> symbol mapping, standing in for a module's globals.
///
/// Entries enumerate in definition order. Redefining a name swaps the value
/// but keeps the slot it was first defined in.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<(String, Symbol)>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn define(&mut self, name: impl Into<String>, symbol: impl Into<Symbol>) -> &mut Self {
        let name = name.into();
        let symbol = symbol.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = symbol,
            None => self.entries.push((name, symbol)),
        }
        self
    }

    /// Binds a zero-argument closure under `name`.
    pub fn def<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn() -> DemoResult + 'static,
    {
        self.define(name, Function::nullary(name, f))
    }

    /// Binds a fn item under its own name.
    ///
    /// Closures have no usable name; use [`SymbolTable::def`] for those.
    pub fn def_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> DemoResult + 'static,
    {
        let name = name_of(&f);
        self.define(name, Function::nullary(name, f))
    }

    pub fn value(&mut self, name: &str, text: impl Into<String>) -> &mut Self {
        self.define(name, Symbol::Value(text.into()))
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, symbol)| symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.entries
            .iter()
            .map(|(name, symbol)| (name.as_str(), symbol))
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn test_named_item() -> DemoResult {
        Ok(())
    }

    #[test]
    fn test_name_of_fn_item() {
        assert_eq!(name_of(&test_named_item), "test_named_item");
    }

    fn test_generic_item<T: Default>() -> DemoResult {
        let _ = T::default();
        Ok(())
    }

    #[test]
    fn test_name_of_generic_fn_item() {
        assert_eq!(name_of(&test_generic_item::<String>), "test_generic_item");

        let mut table = SymbolTable::new();
        table.def_fn(test_generic_item::<Vec<u8>>);
        assert_eq!(table.names(), vec!["test_generic_item"]);
    }

    #[test]
    fn test_def_fn_uses_item_name() {
        let mut table = SymbolTable::new();
        table.def_fn(test_named_item);
        assert_eq!(table.names(), vec!["test_named_item"]);
        assert_eq!(
            table.get("test_named_item").map(|s| s.to_string()),
            Some("<function test_named_item>".to_string())
        );
    }

    #[test]
    fn test_definition_order_is_kept() {
        let mut table = SymbolTable::new();
        table
            .def("test_b", || Ok(()))
            .value("helper", "data")
            .def("test_a", || Ok(()));
        assert_eq!(table.names(), vec!["test_b", "helper", "test_a"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_redefinition_keeps_slot() {
        let hits = Rc::new(Cell::new(0));
        let mut table = SymbolTable::new();
        table.def("test_a", || Ok(())).def("test_b", || Ok(()));

        let counter = Rc::clone(&hits);
        table.def("test_a", move || {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert_eq!(table.names(), vec!["test_a", "test_b"]);
        table.get("test_a").unwrap().invoke("test_a").unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_value_is_not_callable() {
        let mut table = SymbolTable::new();
        table.value("answer", "42");
        let symbol = table.get("answer").unwrap();
        assert!(!symbol.is_callable());
        assert_eq!(symbol.to_string(), "\"42\"");
        assert!(matches!(
            symbol.invoke("answer"),
            Err(RunError::NotCallable { ref name, .. }) if name == "answer"
        ));
    }

    #[test]
    fn test_arity_checked_before_body() {
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        let func = Function::with_arity("test_pair", 2, move |_args| {
            flag.set(true);
            Ok(())
        });
        assert_eq!(func.name(), "test_pair");
        assert_eq!(func.arity(), 2);

        assert!(matches!(
            func.call(&[]),
            Err(RunError::Arity { arity: 2, given: 0, .. })
        ));
        assert!(!ran.get());

        func.call(&["a", "b"]).unwrap();
        assert!(ran.get());
    }

    #[test]
    fn test_body_error_becomes_invocation_error() {
        let func = Function::nullary("test_fail", || anyhow::bail!("bad recipe"));
        let err = func.call(&[]).unwrap_err();
        assert!(matches!(err, RunError::Invocation { .. }));
        assert!(err.to_string().contains("bad recipe"));
    }

    #[test]
    fn test_empty_table() {
        let table = SymbolTable::default();
        assert!(table.is_empty());
        assert!(table.get("anything").is_none());
    }
}
