//! # Dimension Scopes
//!
//! Symbol tables for symbolic dimensions. A symbol binds to the first
//! extent seen for it and every later reference in the same scope must
//! agree. Bindings are never altered once made.
//!
//! [`DimensionScopes`] is a stack: a group that resets scope pushes a
//! fresh table on entry and pops it on exit, so the parent's bindings are
//! visible again afterwards. Definition-level symbols live in a separate
//! table that is never reset during an entry.

use std::collections::{HashMap, HashSet};

use nexval_core::NodePath;

/// A symbol's extent and the field axis that fixed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub extent: usize,
    pub bound_at: NodePath,
}

/// One symbol table.
#[derive(Debug, Clone, Default)]
pub struct DimensionScope {
    bindings: HashMap<String, Binding>,
}

impl DimensionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Binding> {
        self.bindings.get(symbol)
    }

    /// Bind `symbol` to `extent` if unbound. Returns the existing binding
    /// when it disagrees.
    pub fn check_or_bind(&mut self, symbol: &str, extent: usize, at: &NodePath) -> Result<(), Binding> {
        match self.bindings.get(symbol) {
            Some(existing) if existing.extent == extent => Ok(()),
            Some(existing) => Err(existing.clone()),
            None => {
                tracing::trace!(symbol, extent, at = %at, "bound dimension symbol");
                self.bindings.insert(
                    symbol.to_string(),
                    Binding {
                        extent,
                        bound_at: at.clone(),
                    },
                );
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The scope state for one entry.
#[derive(Debug, Clone)]
pub struct DimensionScopes {
    global_symbols: HashSet<String>,
    global: DimensionScope,
    frames: Vec<DimensionScope>,
}

impl DimensionScopes {
    /// Fresh state with `global_symbols` shared entry-wide.
    pub fn new<I, S>(global_symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            global_symbols: global_symbols.into_iter().map(Into::into).collect(),
            global: DimensionScope::new(),
            frames: vec![DimensionScope::new()],
        }
    }

    /// Enter a group that resets scope.
    pub fn push(&mut self) {
        self.frames.push(DimensionScope::new());
    }

    /// Leave a group that reset scope. The outermost frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Current nesting depth (1 outside any resetting group).
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The table that owns `symbol` right now.
    fn table_mut(&mut self, symbol: &str) -> &mut DimensionScope {
        if self.global_symbols.contains(symbol) {
            return &mut self.global;
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn get(&self, symbol: &str) -> Option<&Binding> {
        if self.global_symbols.contains(symbol) {
            self.global.get(symbol)
        } else {
            self.frames.last().and_then(|f| f.get(symbol))
        }
    }

    pub fn check_or_bind(&mut self, symbol: &str, extent: usize, at: &NodePath) -> Result<(), Binding> {
        self.table_mut(symbol).check_or_bind(symbol, extent, at)
    }
}

impl Default for DimensionScopes {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}
