use crate::error::CodecError;
use crate::model::FieldValue;
use ahash::AHashMap;
use serde_json::Value;

/// Converts field values of one data type to and from their persisted JSON form.
pub trait DataMarshaler: Send + Sync {
    fn data_type(&self) -> &str;
    fn to_persisted(&self, value: &FieldValue) -> Result<Value, CodecError>;
    fn from_persisted(&self, json: &Value) -> Result<FieldValue, CodecError>;
}

fn marshal_error(data_type: &str, message: String) -> CodecError {
    CodecError::Marshal {
        data_type: data_type.to_string(),
        message,
    }
}

/// Defines the built-in marshalers and the function that registers them.
///
/// `null` passes through every built-in marshaler unchanged, so unset fields survive a round trip.
macro_rules! define_marshalers {
    ( $( ($struct_name:ident, $data_type:expr, |$json:ident| $decode:expr) ),* $(,)? ) => {
        $(
            struct $struct_name;
            impl DataMarshaler for $struct_name {
                fn data_type(&self) -> &str { $data_type }

                fn to_persisted(&self, value: &FieldValue) -> Result<Value, CodecError> {
                    if *value != FieldValue::Null && !value.conforms_to($data_type) {
                        return Err(marshal_error(
                            $data_type,
                            format!("cannot persist a '{}' value", value.type_tag()),
                        ));
                    }
                    serde_json::to_value(value).map_err(|e| marshal_error($data_type, e.to_string()))
                }

                fn from_persisted(&self, $json: &Value) -> Result<FieldValue, CodecError> {
                    if $json.is_null() {
                        return Ok(FieldValue::Null);
                    }
                    let decoded: Option<FieldValue> = $decode;
                    decoded.ok_or_else(|| marshal_error($data_type, format!("unexpected JSON value {}", $json)))
                }
            }
        )*

        fn register_default_marshalers(table: &mut AHashMap<String, Box<dyn DataMarshaler>>) {
            $( table.insert($data_type.to_string(), Box::new($struct_name)); )*
        }
    };
}

define_marshalers! {
    (NumberMarshaler, "number", |json| json.as_f64().map(FieldValue::Number)),
    (BooleanMarshaler, "boolean", |json| json.as_bool().map(FieldValue::Bool)),
    (StringMarshaler, "string", |json| json.as_str().map(FieldValue::from)),
    (VectorMarshaler, "vector", |json| json
        .as_array()
        .and_then(|items| items.iter().map(Value::as_f64).collect::<Option<Vec<f64>>>())
        .map(FieldValue::Vector)),
    (AnyMarshaler, "any", |json| serde_json::from_value::<FieldValue>(json.clone()).ok()),
}

/// Data-type tag to marshaler lookup, consulted for every field on save and load.
pub struct MarshalerTable {
    marshalers: AHashMap<String, Box<dyn DataMarshaler>>,
}

impl MarshalerTable {
    /// A table with no marshalers at all.
    pub fn empty() -> Self {
        Self {
            marshalers: AHashMap::new(),
        }
    }

    /// A table with `number`, `boolean`, `string`, `vector` and `any` registered.
    pub fn with_defaults() -> Self {
        let mut marshalers = AHashMap::new();
        register_default_marshalers(&mut marshalers);
        Self { marshalers }
    }

    /// Adds or replaces the marshaler for its data type.
    pub fn register(&mut self, marshaler: Box<dyn DataMarshaler>) {
        self.marshalers
            .insert(marshaler.data_type().to_string(), marshaler);
    }

    pub fn get(&self, data_type: &str) -> Result<&dyn DataMarshaler, CodecError> {
        self.marshalers
            .get(data_type)
            .map(|m| m.as_ref())
            .ok_or_else(|| CodecError::MissingMarshaler(data_type.to_string()))
    }

    pub fn contains(&self, data_type: &str) -> bool {
        self.marshalers.contains_key(data_type)
    }
}

impl Default for MarshalerTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for MarshalerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.marshalers.keys().collect();
        types.sort();
        f.debug_struct("MarshalerTable").field("types", &types).finish()
    }
}
