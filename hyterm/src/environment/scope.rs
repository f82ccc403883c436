//! Lexical scopes.
//!
//! Local bindings (lambda parameters, substituted arguments) live in a persistent linked list
//! of frames: extending a scope never touches the scopes already captured by closures. Global
//! bindings live in the mutable [`BindingTable`] of an environment and its ancestors.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{attributes::BoundAttributes, expr::{Expr, Symbol}};

/// What a symbol stands for, and where its expression must be evaluated.
#[derive(Clone, Debug)]
pub struct Binding {
    pub attributes: BoundAttributes,
    /// Higher order declared for the symbol itself (`_` when none was given).
    pub symbol_higher_order: Expr,
    pub expression: Expr,
    pub closure: Scope,
}

struct Frame {
    symbol: Symbol,
    /// `None` shadows outer bindings without providing a value.
    binding: Option<Binding>,
    parent: Scope,
}

/// Immutable, cheaply clonable chain of local frames.
#[derive(Clone, Default)]
pub struct Scope(Option<Arc<Frame>>);

impl Scope {
    pub fn root() -> Self {
        Scope(None)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    /// A child scope where `symbol` maps to `binding`.
    pub fn bind(&self, symbol: Symbol, binding: Binding) -> Scope {
        Scope(Some(Arc::new(Frame {
            symbol,
            binding: Some(binding),
            parent: self.clone(),
        })))
    }

    /// A child scope where `symbol` is local but has no value.
    pub fn shadow(&self, symbol: Symbol) -> Scope {
        Scope(Some(Arc::new(Frame {
            symbol,
            binding: None,
            parent: self.clone(),
        })))
    }

    /// Innermost frame for `symbol`: `Some(None)` when shadowed, `None` when not local.
    pub fn find(&self, symbol: &str) -> Option<Option<&Binding>> {
        let mut current = self.0.as_deref();
        while let Some(frame) = current {
            if &*frame.symbol == symbol {
                return Some(frame.binding.as_ref());
            }
            current = frame.parent.0.as_deref();
        }
        None
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.0.as_deref();
        while let Some(frame) = current {
            depth += 1;
            current = frame.parent.0.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        let mut current = self.0.as_deref();
        while let Some(frame) = current {
            list.entry(&frame.symbol);
            current = frame.parent.0.as_deref();
        }
        list.finish()
    }
}

/// Result of resolving a symbol from a scope.
#[derive(Clone, Debug)]
pub enum Lookup {
    Bound { binding: Binding, global: bool },
    /// A local parameter without a value.
    Shadowed,
    Free,
}

/// Mutable global bindings of one environment, falling back to its parent's.
#[derive(Default)]
pub struct BindingTable {
    bindings: RwLock<HashMap<Symbol, Binding>>,
    parent: Option<Arc<BindingTable>>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Arc<BindingTable>) -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Install or overwrite a binding in this table.
    pub fn insert(&self, symbol: Symbol, binding: Binding) -> Option<Binding> {
        self.bindings.write().insert(symbol, binding)
    }

    /// Innermost binding, walking up the parent tables.
    pub fn get(&self, symbol: &str) -> Option<Binding> {
        if let Some(binding) = self.bindings.read().get(symbol) {
            return Some(binding.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(symbol))
    }

    /// Symbols bound directly in this table, sorted.
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.bindings.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("symbols", &self.symbols())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, unspecified};

    fn binding(value: i32) -> Binding {
        Binding {
            attributes: BoundAttributes::NEUTRAL,
            symbol_higher_order: unspecified(),
            expression: constant(value),
            closure: Scope::root(),
        }
    }

    #[test]
    fn innermost_frame_wins() {
        let outer = Scope::root().bind("x".into(), binding(1));
        let inner = outer.bind("x".into(), binding(2));
        let shadowed = inner.shadow("x".into());

        assert_eq!(inner.find("x").flatten().unwrap().expression, constant(2));
        assert_eq!(outer.find("x").flatten().unwrap().expression, constant(1));
        assert!(matches!(shadowed.find("x"), Some(None)));
        assert!(shadowed.find("y").is_none());
        assert_eq!(shadowed.depth(), 3);
    }

    #[test]
    fn tables_fall_back_to_parent() {
        let parent = Arc::new(BindingTable::new());
        parent.insert("x".into(), binding(1));
        let child = BindingTable::with_parent(parent.clone());
        assert_eq!(child.get("x").unwrap().expression, constant(1));
        child.insert("x".into(), binding(2));
        assert_eq!(child.get("x").unwrap().expression, constant(2));
        assert_eq!(parent.get("x").unwrap().expression, constant(1));
    }
}
