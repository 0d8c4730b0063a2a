//! Process-global registry of attribute value types for record decoding.
//!
//! An [`AttributeManagerRecord`](crate::attribute::AttributeManagerRecord)
//! names each attribute's value type; decoding looks the name up here and
//! dispatches to the registered decoder. Common primitive types are
//! pre-registered; applications storing their own value types call
//! [`register_attribute_type`] once before decoding records that use them.
//!
//! The registry is the only process-global synchronized state in the crate
//! and sits on no model mutation path.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::attribute::manager::{AttributeEntryRecord, ErasedAttribute};
use crate::attribute::store::{Attribute, AttributeValue};
use crate::model_error::ModelWeldError;
use crate::record;

type DecodeFn = fn(&AttributeEntryRecord, usize) -> Result<Box<dyn ErasedAttribute>, ModelWeldError>;

fn decode_entry<T: AttributeValue>(
    entry: &AttributeEntryRecord,
    size: usize,
) -> Result<Box<dyn ErasedAttribute>, ModelWeldError> {
    let default: T = record::decode(&entry.default)?;
    let attr = Attribute::<T>::decode_payload(default, entry.repr, size, &entry.payload)?;
    Ok(Box::new(attr))
}

static DECODERS: Lazy<RwLock<HashMap<String, DecodeFn>>> = Lazy::new(|| {
    let mut table: HashMap<String, DecodeFn> = HashMap::new();
    macro_rules! builtin {
        ($($ty:ty),* $(,)?) => {
            $(table.insert(
                std::any::type_name::<$ty>().to_string(),
                decode_entry::<$ty> as DecodeFn,
            );)*
        };
    }
    builtin!(bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, f32, f64, String);
    RwLock::new(table)
});

/// Registers `T` so attributes storing it can be decoded from records.
///
/// Keys are `std::any::type_name::<T>()`; registering the same type twice is
/// a no-op. Call this once per application value type before
/// [`AttributeManager::from_record`](crate::attribute::AttributeManager::from_record).
pub fn register_attribute_type<T: AttributeValue>() {
    DECODERS
        .write()
        .insert(std::any::type_name::<T>().to_string(), decode_entry::<T>);
}

/// Decodes one record entry through the registry.
pub(crate) fn decode_attribute(
    entry: &AttributeEntryRecord,
    size: usize,
) -> Result<Box<dyn ErasedAttribute>, ModelWeldError> {
    let decode = DECODERS
        .read()
        .get(entry.value_type.as_str())
        .copied()
        .ok_or_else(|| ModelWeldError::UnknownAttributeType(entry.value_type.clone()))?;
    decode(entry, size)
}
