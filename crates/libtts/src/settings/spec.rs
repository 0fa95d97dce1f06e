use super::SettingsModel;
use schemars::schema::{InstanceType, Schema, SchemaObject, SingleOrVec};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Value type of a setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    String,
    Integer,
    Number,
    Boolean,
    /// A string restricted to [`SettingSpec::values`]
    Enum,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKind::String => "string",
            SettingKind::Integer => "integer",
            SettingKind::Number => "number",
            SettingKind::Boolean => "boolean",
            SettingKind::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// Description of one setting: its type, constraints and default.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SettingSpec {
    pub name: String,
    pub kind: SettingKind,
    /// Whether `null` is accepted (optional settings)
    pub nullable: bool,
    /// Lowest value for numbers, shortest length for strings
    pub min: Option<f64>,
    /// Highest value for numbers, longest length for strings
    pub max: Option<f64>,
    /// Allowed values for enums
    pub values: Option<Vec<String>>,
    pub default: Value,
    /// Short human-readable label, in the plugin's source language
    pub title: Option<String>,
    pub description: Option<String>,
}

impl SettingSpec {
    /// Label for UIs, falling back to the setting name.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn type_name(&self) -> String {
        if self.nullable {
            format!("{} or null", self.kind)
        } else {
            self.kind.to_string()
        }
    }
}

/// Ordered sequence of [`SettingSpec`], in field declaration order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SettingsSpecification {
    fields: Vec<SettingSpec>,
}

impl SettingsSpecification {
    /// Generate the specification of `S` from its JSON schema.
    pub fn of<S: SettingsModel>() -> Self {
        let root = schemars::schema_for!(S);
        let defaults = S::default().to_dict();
        let Some(object) = root.schema.object.as_ref() else {
            log::warn!("Settings schema has no properties; is the settings type a struct?");
            return Self::default();
        };

        let fields = object
            .properties
            .iter()
            .map(|(name, schema)| {
                let mut shape = Shape::default();
                let mut title = None;
                let mut description = None;
                if let Schema::Object(obj) = schema {
                    if let Some(metadata) = obj.metadata.as_ref() {
                        title = metadata.title.clone();
                        description = metadata.description.clone();
                    }
                    shape.visit(obj, &root.definitions);
                }
                shape.into_spec(
                    name.clone(),
                    defaults.get(name).cloned().unwrap_or(Value::Null),
                    title,
                    description,
                )
            })
            .collect();

        Self { fields }
    }

    pub fn fields(&self) -> &[SettingSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&SettingSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SettingSpec> {
        self.fields.iter()
    }
}

/// Value range of the integer type behind a schemars `format`.
fn integer_bounds(format: &str) -> Option<(f64, f64)> {
    let bounds = match format {
        "int8" => (i8::MIN as f64, i8::MAX as f64),
        "int16" => (i16::MIN as f64, i16::MAX as f64),
        "int32" => (i32::MIN as f64, i32::MAX as f64),
        "int64" | "int" => (i64::MIN as f64, i64::MAX as f64),
        "uint8" => (0.0, u8::MAX as f64),
        "uint16" => (0.0, u16::MAX as f64),
        "uint32" => (0.0, u32::MAX as f64),
        "uint64" | "uint" => (0.0, u64::MAX as f64),
        _ => return None,
    };
    Some(bounds)
}

/// Accumulates what a (possibly nested) property schema says about a field.
#[derive(Default)]
struct Shape {
    kind: Option<SettingKind>,
    nullable: bool,
    min: Option<f64>,
    max: Option<f64>,
    values: Vec<String>,
}

impl Shape {
    fn visit(&mut self, schema: &SchemaObject, definitions: &schemars::Map<String, Schema>) {
        if let Some(reference) = schema.reference.as_deref() {
            let name = reference.rsplit('/').next().unwrap_or(reference);
            if let Some(Schema::Object(target)) = definitions.get(name) {
                self.visit(target, definitions);
            }
        }

        match schema.instance_type.as_ref() {
            Some(SingleOrVec::Single(ty)) => self.instance_type(ty),
            Some(SingleOrVec::Vec(types)) => types.iter().for_each(|ty| self.instance_type(ty)),
            None => {}
        }

        if let Some(values) = schema.enum_values.as_ref() {
            self.values
                .extend(values.iter().filter_map(Value::as_str).map(str::to_string));
        }
        if let Some(Value::String(value)) = schema.const_value.as_ref() {
            self.values.push(value.clone());
        }

        if let Some(number) = schema.number.as_ref() {
            self.min = number.minimum.or(self.min);
            self.max = number.maximum.or(self.max);
        }
        if let Some((lo, hi)) = schema.format.as_deref().and_then(integer_bounds) {
            self.min = Some(self.min.map_or(lo, |min| min.max(lo)));
            self.max = Some(self.max.map_or(hi, |max| max.min(hi)));
        }
        if let Some(string) = schema.string.as_ref() {
            self.min = string.min_length.map(f64::from).or(self.min);
            self.max = string.max_length.map(f64::from).or(self.max);
        }

        if let Some(subschemas) = schema.subschemas.as_ref() {
            let nested = [
                subschemas.all_of.as_ref(),
                subschemas.any_of.as_ref(),
                subschemas.one_of.as_ref(),
            ];
            for sub in nested.into_iter().flatten().flatten() {
                if let Schema::Object(obj) = sub {
                    self.visit(obj, definitions);
                }
            }
        }
    }

    fn instance_type(&mut self, ty: &InstanceType) {
        let kind = match ty {
            InstanceType::Null => {
                self.nullable = true;
                return;
            }
            InstanceType::Boolean => SettingKind::Boolean,
            InstanceType::Integer => SettingKind::Integer,
            InstanceType::Number => SettingKind::Number,
            InstanceType::String => SettingKind::String,
            InstanceType::Object | InstanceType::Array => {
                log::warn!("Nested settings values are not supported; treating as string");
                SettingKind::String
            }
        };
        self.kind.get_or_insert(kind);
    }

    fn into_spec(
        self,
        name: String,
        default: Value,
        title: Option<String>,
        description: Option<String>,
    ) -> SettingSpec {
        let (kind, values) = if self.values.is_empty() {
            (self.kind.unwrap_or(SettingKind::String), None)
        } else {
            (SettingKind::Enum, Some(self.values))
        };
        let (min, max) = match kind {
            SettingKind::Enum | SettingKind::Boolean => (None, None),
            _ => (self.min, self.max),
        };
        SettingSpec {
            name,
            kind,
            nullable: self.nullable,
            min,
            max,
            values,
            default,
            title,
            description,
        }
    }
}
