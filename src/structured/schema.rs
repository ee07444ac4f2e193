//! Schema descriptions and flattening.
//!
//! A [`SchemaType`] is built once, when a schema is declared, and every later
//! operation is an exhaustive match over it. Declarations come from three places:
//! hand-built values, Rust types deriving [`schemars::JsonSchema`], and
//! already-flattened field-type maps received as dynamic arguments. Anything that
//! does not reduce to string, bool, float, int, record or sequence is rejected at
//! declaration time with [`Error::UnsupportedSchemaType`].

use crate::{Error, Result};
use schemars::schema::{InstanceType, RootSchema, Schema, SchemaObject, SingleOrVec};
use schemars::JsonSchema;
use schemars::Map as SchemaMap;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Bool,
    Float,
    Int,
}

impl ScalarKind {
    /// Wire tag used in flattened field-type maps.
    pub fn tag(&self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Float => "float",
            ScalarKind::Int => "int",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(ScalarKind::String),
            "bool" => Some(ScalarKind::Bool),
            "float" => Some(ScalarKind::Float),
            "int" => Some(ScalarKind::Int),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: SchemaType,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSchema {
    fields: Vec<Field>,
}

impl RecordSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn field(self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.with_field(Field {
            name: name.into(),
            ty,
            required: true,
        })
    }

    /// Add a field the producer may leave out.
    pub fn optional_field(self, name: impl Into<String>, ty: SchemaType) -> Self {
        self.with_field(Field {
            name: name.into(),
            ty,
            required: false,
        })
    }

    fn with_field(mut self, field: Field) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaType {
    Scalar(ScalarKind),
    Record(RecordSchema),
    Sequence(Box<SchemaType>),
}

impl SchemaType {
    pub fn string() -> Self {
        SchemaType::Scalar(ScalarKind::String)
    }

    pub fn boolean() -> Self {
        SchemaType::Scalar(ScalarKind::Bool)
    }

    pub fn float() -> Self {
        SchemaType::Scalar(ScalarKind::Float)
    }

    pub fn integer() -> Self {
        SchemaType::Scalar(ScalarKind::Int)
    }

    pub fn sequence(element: SchemaType) -> Self {
        SchemaType::Sequence(Box::new(element))
    }

    /// Record whose fields are all required.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaType)>,
        K: Into<String>,
    {
        SchemaType::Record(
            fields
                .into_iter()
                .fold(RecordSchema::new(), |rec, (name, ty)| rec.field(name, ty)),
        )
    }

    /// Declare the schema of a Rust type.
    pub fn of<T: JsonSchema>() -> Result<Self> {
        Self::from_root_schema(&schemars::schema_for!(T))
    }

    pub fn from_root_schema(root: &RootSchema) -> Result<Self> {
        Converter {
            definitions: &root.definitions,
            visiting: Vec::new(),
        }
        .convert(&root.schema, "$")
    }

    /// Rebuild a schema from its flattened field-type map (the inverse of [`SchemaType::flatten`]).
    pub fn from_flattened(value: &Value) -> Result<Self> {
        from_flattened_at(value, "$")
    }

    /// Field-type map sent to the remote service.
    pub fn flatten(&self) -> Value {
        match self {
            SchemaType::Scalar(kind) => Value::String(kind.tag().to_string()),
            SchemaType::Sequence(element) => Value::Array(vec![element.flatten()]),
            SchemaType::Record(record) => {
                let mut map = Map::new();
                for field in record.fields() {
                    map.insert(field.name.clone(), field.ty.flatten());
                }
                Value::Object(map)
            }
        }
    }

    pub fn as_record(&self) -> Option<&RecordSchema> {
        match self {
            SchemaType::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Scalar(kind) => f.write_str(kind.tag()),
            SchemaType::Sequence(element) => write!(f, "[{}]", element),
            SchemaType::Record(record) => {
                f.write_str("{")?;
                for (i, field) in record.fields().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Flatten the schema of a Rust type in one step.
pub fn flatten<T: JsonSchema>() -> Result<Value> {
    Ok(SchemaType::of::<T>()?.flatten())
}

fn from_flattened_at(value: &Value, path: &str) -> Result<SchemaType> {
    match value {
        Value::String(tag) => ScalarKind::from_tag(tag)
            .map(SchemaType::Scalar)
            .ok_or_else(|| Error::unsupported_schema_type(tag.as_str(), path)),
        Value::Array(items) if items.len() == 1 => Ok(SchemaType::sequence(from_flattened_at(
            &items[0],
            &format!("{}[]", path),
        )?)),
        Value::Array(items) => Err(Error::unsupported_schema_type(
            format!("sequence template with {} element types", items.len()),
            path,
        )),
        Value::Object(map) => {
            let mut record = RecordSchema::new();
            for (name, ty) in map {
                record = record.field(name.clone(), from_flattened_at(ty, &format!("{}.{}", path, name))?);
            }
            Ok(SchemaType::Record(record))
        }
        Value::Null => Err(Error::unsupported_schema_type("null", path)),
        Value::Bool(_) => Err(Error::unsupported_schema_type("bool literal", path)),
        Value::Number(_) => Err(Error::unsupported_schema_type("number literal", path)),
    }
}

struct Converter<'a> {
    definitions: &'a SchemaMap<String, Schema>,
    visiting: Vec<String>,
}

impl Converter<'_> {
    fn convert_schema(&mut self, schema: &Schema, path: &str) -> Result<SchemaType> {
        match schema {
            Schema::Object(obj) => self.convert(obj, path),
            Schema::Bool(true) => Err(Error::unsupported_schema_type("any", path)),
            Schema::Bool(false) => Err(Error::unsupported_schema_type("never", path)),
        }
    }

    fn convert(&mut self, obj: &SchemaObject, path: &str) -> Result<SchemaType> {
        if let Some(reference) = &obj.reference {
            return self.convert_reference(reference, path);
        }

        // Documented struct fields are wrapped as `allOf: [{$ref}]`.
        if obj.instance_type.is_none() {
            if let Some(all_of) = obj.subschemas.as_ref().and_then(|s| s.all_of.as_ref()) {
                if all_of.len() == 1 {
                    return self.convert_schema(&all_of[0], path);
                }
            }
        }

        if obj.enum_values.is_some() || obj.const_value.is_some() {
            return Err(Error::unsupported_schema_type("enum", path));
        }

        let instance = match &obj.instance_type {
            Some(SingleOrVec::Single(t)) => t.as_ref(),
            Some(SingleOrVec::Vec(types)) => {
                let names: Vec<&str> = types.iter().map(instance_name).collect();
                return Err(Error::unsupported_schema_type(names.join(" | "), path));
            }
            None if obj.subschemas.is_some() => {
                return Err(Error::unsupported_schema_type("union", path));
            }
            None => return Err(Error::unsupported_schema_type("any", path)),
        };

        match instance {
            InstanceType::String => Ok(SchemaType::string()),
            InstanceType::Boolean => Ok(SchemaType::boolean()),
            InstanceType::Number => Ok(SchemaType::float()),
            InstanceType::Integer => Ok(SchemaType::integer()),
            InstanceType::Array => {
                let items = obj.array.as_ref().and_then(|a| a.items.as_ref());
                match items {
                    Some(SingleOrVec::Single(item)) => Ok(SchemaType::sequence(
                        self.convert_schema(item, &format!("{}[]", path))?,
                    )),
                    Some(SingleOrVec::Vec(_)) => Err(Error::unsupported_schema_type("tuple", path)),
                    None => Err(Error::unsupported_schema_type("untyped array", path)),
                }
            }
            InstanceType::Object => self.convert_object(obj, path),
            InstanceType::Null => Err(Error::unsupported_schema_type("null", path)),
        }
    }

    fn convert_object(&mut self, obj: &SchemaObject, path: &str) -> Result<SchemaType> {
        let Some(validation) = obj.object.as_ref() else {
            return Err(Error::unsupported_schema_type("untyped object", path));
        };

        let is_map = validation.properties.is_empty()
            && matches!(
                validation.additional_properties.as_deref(),
                Some(Schema::Object(_)) | Some(Schema::Bool(true))
            );
        if is_map {
            return Err(Error::unsupported_schema_type("map", path));
        }

        let mut record = RecordSchema::new();
        for (name, schema) in &validation.properties {
            let ty = self.convert_schema(schema, &format!("{}.{}", path, name))?;
            record = if validation.required.contains(name) {
                record.field(name.clone(), ty)
            } else {
                record.optional_field(name.clone(), ty)
            };
        }
        Ok(SchemaType::Record(record))
    }

    fn convert_reference(&mut self, reference: &str, path: &str) -> Result<SchemaType> {
        let name = reference
            .strip_prefix("#/definitions/")
            .unwrap_or(reference)
            .to_string();

        if self.visiting.contains(&name) {
            return Err(Error::unsupported_schema_type(
                format!("recursive type {}", name),
                path,
            ));
        }

        let definitions = self.definitions;
        let schema = definitions
            .get(&name)
            .ok_or_else(|| Error::unsupported_schema_type(format!("unresolved reference {}", reference), path))?;

        self.visiting.push(name);
        let converted = self.convert_schema(schema, path);
        self.visiting.pop();
        converted
    }
}

fn instance_name(t: &InstanceType) -> &'static str {
    match t {
        InstanceType::Null => "null",
        InstanceType::Boolean => "boolean",
        InstanceType::Object => "object",
        InstanceType::Array => "array",
        InstanceType::Number => "number",
        InstanceType::String => "string",
        InstanceType::Integer => "integer",
    }
}
