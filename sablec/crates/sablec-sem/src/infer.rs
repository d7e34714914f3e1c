//! The inference engine: an append-only store of type descriptors.
//!
//! Entries are never removed; a `TypeId` once issued stays valid for the
//! life of the compilation unit. Unification mutates entries in place by
//! installing `Ref` indirection nodes.

use std::ops::Index;

use sablec_util::{FxHashMap, IndexVec};

use crate::error::TypeCheckError;
use crate::types::{Primitive, TypeId, TypeInfo};

/// The append-only table of type descriptors underlying inference.
#[derive(Debug)]
pub struct TypeStore {
    entries: IndexVec<TypeId, TypeInfo>,
    /// Annotation-resolver table: builtin type names to seeded ids.
    builtins: FxHashMap<&'static str, TypeId>,
}

impl TypeStore {
    /// Create a store with `Unknown` slotted at id 0 and the deterministic
    /// primitive suite seeded behind the builtin name table.
    pub fn new() -> Self {
        let mut store = Self {
            entries: IndexVec::new(),
            builtins: FxHashMap::default(),
        };

        let unknown = store.insert(TypeInfo::Primitive(Primitive::Unknown));
        debug_assert_eq!(unknown, TypeId::UNKNOWN);

        let i64_ty = store.primitive(Primitive::I64);
        let i32_ty = store.primitive(Primitive::I32);
        let bool_ty = store.primitive(Primitive::Bool);
        let nothing = store.primitive(Primitive::Nothing);
        let none_ty = store.primitive(Primitive::NoneType);
        let number = store.primitive(Primitive::Number);

        store.builtins.insert("int", i64_ty);
        store.builtins.insert("i64", i64_ty);
        store.builtins.insert("i32", i32_ty);
        store.builtins.insert("bool", bool_ty);
        store.builtins.insert("none", nothing);
        store.builtins.insert("float", number);
        store.builtins.insert("NoneType", none_ty);

        store
    }

    /// Append a descriptor and return its new id. Does not deduplicate;
    /// used for fresh inference slots.
    pub fn insert(&mut self, info: TypeInfo) -> TypeId {
        self.entries.push(info)
    }

    /// A fresh (non-shared) `Unknown` slot for unification to resolve.
    pub fn fresh_unknown(&mut self) -> TypeId {
        self.insert(TypeInfo::Primitive(Primitive::Unknown))
    }

    /// First id holding a structurally equal descriptor, if any.
    pub fn get_by_value(&self, info: &TypeInfo) -> Option<TypeId> {
        self.entries
            .iter_enumerated()
            .find(|(_, entry)| *entry == info)
            .map(|(id, _)| id)
    }

    /// Lookup-or-append; the canonical entry point for shared descriptors.
    pub fn get_id_or_insert(&mut self, info: TypeInfo) -> TypeId {
        match self.get_by_value(&info) {
            Some(id) => id,
            None => self.insert(info),
        }
    }

    /// Shared id for a primitive kind.
    pub fn primitive(&mut self, kind: Primitive) -> TypeId {
        self.get_id_or_insert(TypeInfo::Primitive(kind))
    }

    /// Seeded id for a builtin type name (annotation resolution).
    pub fn builtin(&self, name: &str) -> Option<TypeId> {
        self.builtins.get(name).copied()
    }

    pub fn get(&self, id: TypeId) -> &TypeInfo {
        &self.entries[id]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Follow `Ref` chains to the id they terminate at.
    pub fn resolve(&self, id: TypeId) -> TypeId {
        let mut current = id;
        while let TypeInfo::Ref { target } = self.entries[current] {
            current = target;
        }
        current
    }

    /// Make the types at `left` and `right` equal, installing `Ref`
    /// indirection or descending structurally.
    ///
    /// No occurs-check is performed: the descriptors this system constructs
    /// cannot be self-referential, so ref chains stay finite.
    pub fn unify(&mut self, left: TypeId, right: TypeId) -> Result<(), TypeCheckError> {
        if left == right {
            return Ok(());
        }

        let left_ty = self.entries[left].clone();
        let right_ty = self.entries[right].clone();

        match (left_ty, right_ty) {
            (TypeInfo::Primitive(Primitive::Unknown), _) => {
                self.entries[left] = TypeInfo::Ref { target: right };
                Ok(())
            }
            (_, TypeInfo::Primitive(Primitive::Unknown)) => {
                self.entries[right] = TypeInfo::Ref { target: left };
                Ok(())
            }
            (TypeInfo::Ref { target }, _) => self.unify(target, right),
            (_, TypeInfo::Ref { target }) => self.unify(left, target),
            (TypeInfo::List { element: a }, TypeInfo::List { element: b }) => self.unify(a, b),
            (
                TypeInfo::Callable {
                    parameters: p1,
                    output: o1,
                },
                TypeInfo::Callable {
                    parameters: p2,
                    output: o2,
                },
            ) => {
                self.unify(p1, p2)?;
                self.unify(o1, o2)
            }
            (TypeInfo::Primitive(a), TypeInfo::Primitive(b)) if a == b => Ok(()),
            _ => Err(TypeCheckError::UnificationFailed {
                left: self.reconstruct(left),
                right: self.reconstruct(right),
            }),
        }
    }

    /// Recursive textual rendering of a type, through `Ref` chains.
    pub fn reconstruct(&self, id: TypeId) -> String {
        match &self.entries[id] {
            TypeInfo::Primitive(kind) => kind.name().to_string(),
            TypeInfo::List { element } => format!("List[{}]", self.reconstruct(*element)),
            TypeInfo::Callable { parameters, output } => format!(
                "Callable[{}, {}]",
                self.reconstruct(*parameters),
                self.reconstruct(*output)
            ),
            TypeInfo::Ref { target } => self.reconstruct(*target),
            TypeInfo::TypeVar { .. } => "TypeVar".to_string(),
        }
    }

    /// Size in bytes of the (resolved) type, when it is a value type.
    pub fn size_of(&self, id: TypeId) -> Option<usize> {
        match self.entries[self.resolve(id)] {
            TypeInfo::Primitive(kind) => kind.size(),
            _ => None,
        }
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<TypeId> for TypeStore {
    type Output = TypeInfo;

    fn index(&self, id: TypeId) -> &TypeInfo {
        &self.entries[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_slot_zero() {
        let store = TypeStore::new();
        assert_eq!(
            store[TypeId::UNKNOWN],
            TypeInfo::Primitive(Primitive::Unknown)
        );
    }

    #[test]
    fn test_get_id_or_insert_is_idempotent() {
        let mut store = TypeStore::new();

        let a = store.get_id_or_insert(TypeInfo::Primitive(Primitive::I64));
        let b = store.get_id_or_insert(TypeInfo::Primitive(Primitive::I64));
        assert_eq!(a, b);
        assert_eq!(store[a], TypeInfo::Primitive(Primitive::I64));

        let list = store.get_id_or_insert(TypeInfo::List { element: a });
        let list2 = store.get_id_or_insert(TypeInfo::List { element: a });
        assert_eq!(list, list2);
    }

    #[test]
    fn test_insert_does_not_dedupe() {
        let mut store = TypeStore::new();
        let a = store.fresh_unknown();
        let b = store.fresh_unknown();
        assert_ne!(a, b);
    }

    #[test]
    fn test_unify_unknown_left() {
        let mut store = TypeStore::new();
        let unknown = store.fresh_unknown();
        let i64_ty = store.primitive(Primitive::I64);

        store.unify(unknown, i64_ty).unwrap();
        assert_eq!(store.reconstruct(unknown), "I64");
        assert_eq!(store.resolve(unknown), i64_ty);
    }

    #[test]
    fn test_unify_unknown_right() {
        let mut store = TypeStore::new();
        let i64_ty = store.primitive(Primitive::I64);
        let unknown = store.fresh_unknown();

        store.unify(i64_ty, unknown).unwrap();
        assert_eq!(store.reconstruct(unknown), "I64");
    }

    #[test]
    fn test_unify_equal_primitives() {
        let mut store = TypeStore::new();
        let a = store.primitive(Primitive::Bool);
        let b = store.primitive(Primitive::Bool);

        store.unify(a, b).unwrap();
        assert_eq!(store.reconstruct(a), store.reconstruct(b));
    }

    #[test]
    fn test_unify_through_refs() {
        let mut store = TypeStore::new();
        let a = store.fresh_unknown();
        let b = store.fresh_unknown();
        let i64_ty = store.primitive(Primitive::I64);

        // a -> b -> I64
        store.unify(a, b).unwrap();
        store.unify(b, i64_ty).unwrap();

        assert_eq!(store.reconstruct(a), "I64");
        assert_eq!(store.resolve(a), i64_ty);
    }

    #[test]
    fn test_unify_lists_descends() {
        let mut store = TypeStore::new();
        let elem = store.fresh_unknown();
        let unknown_list = store.insert(TypeInfo::List { element: elem });
        let i64_ty = store.primitive(Primitive::I64);
        let i64_list = store.insert(TypeInfo::List { element: i64_ty });

        store.unify(unknown_list, i64_list).unwrap();
        assert_eq!(store.reconstruct(unknown_list), "List[I64]");
    }

    #[test]
    fn test_unify_callables_descends() {
        let mut store = TypeStore::new();
        let params = store.fresh_unknown();
        let output = store.fresh_unknown();
        let lhs = store.insert(TypeInfo::Callable { parameters: params, output });

        let i64_ty = store.primitive(Primitive::I64);
        let bool_ty = store.primitive(Primitive::Bool);
        let rhs = store.insert(TypeInfo::Callable {
            parameters: i64_ty,
            output: bool_ty,
        });

        store.unify(lhs, rhs).unwrap();
        assert_eq!(store.reconstruct(lhs), "Callable[I64, Bool]");
    }

    #[test]
    fn test_unify_mismatch_fails_with_both_descriptors() {
        let mut store = TypeStore::new();
        let a = store.primitive(Primitive::I64);
        let b = store.primitive(Primitive::Bool);

        match store.unify(a, b) {
            Err(TypeCheckError::UnificationFailed { left, right }) => {
                assert_eq!(left, "I64");
                assert_eq!(right, "Bool");
            }
            other => panic!("expected unification failure, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_table() {
        let mut store = TypeStore::new();
        let int_id = store.builtin("int").unwrap();
        assert_eq!(int_id, store.primitive(Primitive::I64));
        assert_eq!(store.builtin("int"), store.builtin("i64"));
        assert!(store.builtin("str").is_none());
    }

    #[test]
    fn test_size_of_follows_refs() {
        let mut store = TypeStore::new();
        let unknown = store.fresh_unknown();
        let i64_ty = store.primitive(Primitive::I64);
        store.unify(unknown, i64_ty).unwrap();

        assert_eq!(store.size_of(unknown), Some(8));
        assert_eq!(store.size_of(i64_ty), Some(8));
    }
}
