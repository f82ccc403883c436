//! Host model: the native types and values that leaf terms wrap.
//!
//! The core never reflects on native code. A host binder describes its types with
//! [`HostType`] (name, category and declared bases), registers them in a [`TypeRegistry`],
//! and hands values over as [`Value`]s. Assignability follows the declared bases only.

pub mod member;

use std::{
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use downcast_rs::{DowncastSync, impl_downcast};
use log::{debug, info};
use once_cell::sync::Lazy;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use smallvec::SmallVec;
use strum::{Display, EnumIs, EnumIter};

use crate::error::{TermError, TermResult};

/// Broad classification of a host type, used to order type terms deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIs, EnumIter)]
pub enum TypeCategory {
    Primitive,
    String,
    Enum,
    Value,
    Class,
    Interface,
    Other,
}

#[derive(Debug)]
struct HostTypeData {
    name: Arc<str>,
    category: TypeCategory,
    bases: SmallVec<HostType, 2>,
}

/// Descriptor of a host type. Two descriptors are equal when their names are.
#[derive(Clone)]
pub struct HostType(Arc<HostTypeData>);

impl HostType {
    pub fn new(name: impl Into<Arc<str>>, category: TypeCategory, bases: &[HostType]) -> Self {
        HostType(Arc::new(HostTypeData {
            name: name.into(),
            category,
            bases: bases.iter().cloned().collect(),
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn category(&self) -> TypeCategory {
        self.0.category
    }

    pub fn bases(&self) -> &[HostType] {
        &self.0.bases
    }

    /// Length of the longest chain of declared bases above this type.
    pub fn depth(&self) -> usize {
        self.bases()
            .iter()
            .map(|base| base.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// `true` when a value of `other` can be used where `self` is expected.
    ///
    /// Reflexive, and transitive through the declared bases of `other`.
    pub fn is_assignable_from(&self, other: &HostType) -> bool {
        self == other || other.bases().iter().any(|base| self.is_assignable_from(base))
    }
}

impl PartialEq for HostType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for HostType {}

impl Hash for HostType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostType({})", self.name())
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builtin host types.
pub mod builtin {
    use once_cell::sync::Lazy;

    use super::{HostType, TypeCategory};

    pub static OBJECT: Lazy<HostType> =
        Lazy::new(|| HostType::new("object", TypeCategory::Class, &[]));
    pub static NUMERIC: Lazy<HostType> =
        Lazy::new(|| HostType::new("Numeric", TypeCategory::Interface, &[OBJECT.clone()]));
    pub static FORMATTABLE: Lazy<HostType> =
        Lazy::new(|| HostType::new("Formattable", TypeCategory::Interface, &[OBJECT.clone()]));

    fn numeric(name: &'static str) -> HostType {
        HostType::new(
            name,
            TypeCategory::Primitive,
            &[NUMERIC.clone(), FORMATTABLE.clone(), OBJECT.clone()],
        )
    }

    fn formattable(name: &'static str, category: TypeCategory) -> HostType {
        HostType::new(name, category, &[FORMATTABLE.clone(), OBJECT.clone()])
    }

    pub static U8: Lazy<HostType> = Lazy::new(|| numeric("u8"));
    pub static I8: Lazy<HostType> = Lazy::new(|| numeric("i8"));
    pub static I16: Lazy<HostType> = Lazy::new(|| numeric("i16"));
    pub static U16: Lazy<HostType> = Lazy::new(|| numeric("u16"));
    pub static I32: Lazy<HostType> = Lazy::new(|| numeric("i32"));
    pub static U32: Lazy<HostType> = Lazy::new(|| numeric("u32"));
    pub static I64: Lazy<HostType> = Lazy::new(|| numeric("i64"));
    pub static U64: Lazy<HostType> = Lazy::new(|| numeric("u64"));
    pub static F32: Lazy<HostType> = Lazy::new(|| numeric("f32"));
    pub static F64: Lazy<HostType> = Lazy::new(|| numeric("f64"));
    pub static BOOL: Lazy<HostType> = Lazy::new(|| formattable("bool", TypeCategory::Primitive));
    pub static CHAR: Lazy<HostType> = Lazy::new(|| formattable("char", TypeCategory::Primitive));
    pub static STRING: Lazy<HostType> = Lazy::new(|| formattable("string", TypeCategory::String));
    pub static UNIT: Lazy<HostType> =
        Lazy::new(|| HostType::new("unit", TypeCategory::Value, &[OBJECT.clone()]));

    /// Every builtin, bases before derived types.
    pub fn all() -> Vec<HostType> {
        [
            &OBJECT,
            &NUMERIC,
            &FORMATTABLE,
            &U8,
            &I8,
            &I16,
            &U16,
            &I32,
            &U32,
            &I64,
            &U64,
            &F32,
            &F64,
            &BOOL,
            &CHAR,
            &STRING,
            &UNIT,
        ]
        .into_iter()
        .map(|ty| HostType::clone(ty))
        .collect()
    }
}

/// Opaque host object carried by a [`Value::Object`].
pub trait HostObject: DowncastSync + fmt::Debug {
    fn host_type(&self) -> HostType;

    /// Text shown by the pretty printer.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}
impl_downcast!(sync HostObject);

/// A runtime value wrapped by a constant term.
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Char(char),
    U8(u8),
    I8(i8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    Object(Arc<dyn HostObject>),
}

impl Value {
    pub fn host_type(&self) -> HostType {
        let ty: &Lazy<HostType> = match self {
            Value::Unit => &builtin::UNIT,
            Value::Bool(_) => &builtin::BOOL,
            Value::Char(_) => &builtin::CHAR,
            Value::U8(_) => &builtin::U8,
            Value::I8(_) => &builtin::I8,
            Value::I16(_) => &builtin::I16,
            Value::U16(_) => &builtin::U16,
            Value::I32(_) => &builtin::I32,
            Value::U32(_) => &builtin::U32,
            Value::I64(_) => &builtin::I64,
            Value::U64(_) => &builtin::U64,
            Value::F32(_) => &builtin::F32,
            Value::F64(_) => &builtin::F64,
            Value::String(_) => &builtin::STRING,
            Value::Object(object) => return object.host_type(),
        };
        HostType::clone(ty)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::U8(v) => Some(v.into()),
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object<T: HostObject>(&self) -> Option<&T> {
        match self {
            Value::Object(object) => object.as_ref().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Unit, Unit) => true,
            (Bool(a), Bool(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            // Bitwise so that equality stays reflexive for NaN.
            (F32(a), F32(b)) => a.to_bits() == b.to_bits(),
            (F64(a), F64(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (Object(a), Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Unit => {}
            Value::Bool(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::U8(v) => v.hash(state),
            Value::I8(v) => v.hash(state),
            Value::I16(v) => v.hash(state),
            Value::U16(v) => v.hash(state),
            Value::I32(v) => v.hash(state),
            Value::U32(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::U64(v) => v.hash(state),
            Value::F32(v) => v.to_bits().hash(state),
            Value::F64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Object(v) => (Arc::as_ptr(v) as *const () as usize).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{}'", v.escape_default()),
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v:?}"),
            Value::F64(v) => write!(f, "{v:?}"),
            Value::String(v) => write!(f, "\"{}\"", v.escape_default()),
            Value::Object(v) => f.write_str(&v.describe()),
        }
    }
}

macro_rules! impl_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_value_from! {
    bool => Bool,
    char => Char,
    u8 => U8,
    i8 => I8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}

/// Registry of every host type known to an environment, keyed by name.
///
/// Populated with the [`builtin`] types on construction. Registration is idempotent for an
/// identical definition and fails for a conflicting one.
pub struct TypeRegistry {
    types: RwLock<BTreeMap<Arc<str>, HostType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let types = builtin::all()
            .into_iter()
            .map(|ty| (ty.0.name.clone(), ty))
            .collect();
        Self {
            types: RwLock::new(types),
        }
    }

    pub fn get(&self, name: &str) -> Option<HostType> {
        self.types.read().get(name).cloned()
    }

    /// Register a new host type, or return the existing one when it has the same definition.
    pub fn register(
        &self,
        name: &str,
        category: TypeCategory,
        bases: &[HostType],
    ) -> TermResult<HostType> {
        let types = self.types.upgradable_read();

        if let Some(existing) = types.get(name) {
            if existing.category() == category && existing.bases() == bases {
                debug!("Type '{}' already registered, reusing it", name);
                return Ok(existing.clone());
            }
            return Err(TermError::TypeRedefinition(name.to_string()));
        }

        let ty = HostType::new(name, category, bases);
        let mut types = RwLockUpgradableReadGuard::upgrade(types);
        types.insert(ty.0.name.clone(), ty.clone());
        info!(
            "Registered host type '{}' ({}) with {} base(s)",
            name,
            category,
            bases.len()
        );
        Ok(ty)
    }

    /// Snapshot of every registered type, ordered by name.
    pub fn types(&self) -> Vec<HostType> {
        self.types.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.types.read().keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignability_follows_bases() {
        assert!(builtin::OBJECT.is_assignable_from(&builtin::I32));
        assert!(builtin::NUMERIC.is_assignable_from(&builtin::F64));
        assert!(builtin::FORMATTABLE.is_assignable_from(&builtin::STRING));
        assert!(!builtin::NUMERIC.is_assignable_from(&builtin::STRING));
        assert!(!builtin::I32.is_assignable_from(&builtin::OBJECT));
        assert!(builtin::I32.is_assignable_from(&builtin::I32));
    }

    #[test]
    fn registration_conflicts() {
        let registry = TypeRegistry::new();
        let shape = registry
            .register("Shape", TypeCategory::Interface, &[builtin::OBJECT.clone()])
            .unwrap();
        let again = registry
            .register("Shape", TypeCategory::Interface, &[builtin::OBJECT.clone()])
            .unwrap();
        assert_eq!(shape, again);
        assert!(matches!(
            registry.register("Shape", TypeCategory::Class, &[]),
            Err(TermError::TypeRedefinition(_))
        ));
        assert!(registry.get("i32").is_some());
    }
}
