use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::Value;

/// The declared type of a name. Assignments coerce to the slot's kind,
/// scalars between each other; the compound kinds never convert.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RefKind {
    Int,
    Real,
    Array,
    Record,
    RecordType,
    Function,
}

/// What a name is bound to: its current value and its declared kind.
#[derive(Clone, Debug)]
pub struct RefEntry {
    pub value: Value,
    pub kind: RefKind,
}

/// A shared, mutable binding. Two environments holding the same slot see
/// each other's writes, which is all it takes for by-reference parameters.
pub type Slot = Rc<RefCell<RefEntry>>;

/// A scope: a symbol table plus an optional enclosing scope. Lookups walk
/// the parent chain, declarations always land in the local table.
#[derive(Default, Debug)]
pub struct Environment {
    symbols: HashMap<String, Slot>,
    parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nested(parent: Rc<RefCell<Environment>>) -> Self {
        Self {
            symbols: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Resolve a name through the scope chain.
    pub fn get(&self, name: &str) -> Option<Slot> {
        match self.symbols.get(name) {
            Some(slot) => Some(Rc::clone(slot)),
            None => self.parent.as_ref().and_then(|p| p.borrow().get(name)),
        }
    }

    /// Bind a name in the local scope. Returns false if the name is
    /// already taken locally; shadowing an outer binding is allowed.
    pub fn declare(&mut self, name: &str, slot: Slot) -> bool {
        if self.is_local(name) {
            return false;
        }
        self.symbols.insert(name.to_string(), slot);
        true
    }

    /// A structurally independent copy with fresh slots and deep-copied
    /// values. The copy is parentless.
    pub fn deep_copy(&self) -> Environment {
        let symbols = self
            .symbols
            .iter()
            .map(|(name, slot)| {
                let entry = slot.borrow();
                let copy = RefEntry {
                    value: entry.value.deep_copy(),
                    kind: entry.kind,
                };
                (name.clone(), Rc::new(RefCell::new(copy)))
            })
            .collect();
        Self {
            symbols,
            parent: None,
        }
    }
}
