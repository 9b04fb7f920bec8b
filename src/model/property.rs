//! Property values, cardinalities, and the ordered property collection attached to objects.

// crates.io
use serde_json::Value as JsonValue;
use time::format_description::well_known::{Iso8601, Rfc3339};
// self
use crate::{_prelude::*, error::ParseError, model::property_ids};

/// CMIS property data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
	/// Free-form text.
	String,
	/// Object or type identifier.
	Id,
	/// Arbitrary-precision integer (carried as `i64`).
	Integer,
	/// Decimal number (carried as `f64`).
	Decimal,
	/// Boolean flag.
	Boolean,
	/// Timestamp.
	#[serde(alias = "datetime")]
	DateTime,
	/// HTML fragment.
	Html,
	/// URI string.
	Uri,
}
impl PropertyType {
	/// Returns the wire label (`string`, `dateTime`, ...).
	pub const fn as_str(self) -> &'static str {
		match self {
			PropertyType::String => "string",
			PropertyType::Id => "id",
			PropertyType::Integer => "integer",
			PropertyType::Decimal => "decimal",
			PropertyType::Boolean => "boolean",
			PropertyType::DateTime => "dateTime",
			PropertyType::Html => "html",
			PropertyType::Uri => "uri",
		}
	}

	/// Maps an AtomPub property element name (`propertyString`, ...) onto a type.
	pub fn from_element_name(name: &str) -> Option<Self> {
		let ty = match name {
			"propertyString" => PropertyType::String,
			"propertyId" => PropertyType::Id,
			"propertyInteger" => PropertyType::Integer,
			"propertyDecimal" => PropertyType::Decimal,
			"propertyBoolean" => PropertyType::Boolean,
			"propertyDateTime" => PropertyType::DateTime,
			"propertyHtml" => PropertyType::Html,
			"propertyUri" => PropertyType::Uri,
			_ => return None,
		};

		Some(ty)
	}

	/// Returns the AtomPub property element name for this type.
	pub const fn element_name(self) -> &'static str {
		match self {
			PropertyType::String => "propertyString",
			PropertyType::Id => "propertyId",
			PropertyType::Integer => "propertyInteger",
			PropertyType::Decimal => "propertyDecimal",
			PropertyType::Boolean => "propertyBoolean",
			PropertyType::DateTime => "propertyDateTime",
			PropertyType::Html => "propertyHtml",
			PropertyType::Uri => "propertyUri",
		}
	}
}
impl FromStr for PropertyType {
	type Err = ParseError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let ty = match s {
			"string" => PropertyType::String,
			"id" => PropertyType::Id,
			"integer" => PropertyType::Integer,
			"decimal" => PropertyType::Decimal,
			"boolean" => PropertyType::Boolean,
			"dateTime" | "datetime" => PropertyType::DateTime,
			"html" => PropertyType::Html,
			"uri" => PropertyType::Uri,
			other => return Err(ParseError::new(format!("unknown property type `{other}`"))),
		};

		Ok(ty)
	}
}

/// Whether a property holds one value or a list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
	/// At most one value.
	#[default]
	Single,
	/// Zero or more values.
	Multiple,
}

/// When a property may be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Updatability {
	/// Never writable by clients.
	#[default]
	ReadOnly,
	/// Writable at any time.
	ReadWrite,
	/// Writable only when the object is created.
	OnCreate,
	/// Writable only on a private working copy.
	WhenCheckedOut,
}
impl FromStr for Updatability {
	type Err = ParseError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"readonly" => Ok(Updatability::ReadOnly),
			"readwrite" => Ok(Updatability::ReadWrite),
			"oncreate" => Ok(Updatability::OnCreate),
			"whencheckedout" => Ok(Updatability::WhenCheckedOut),
			other => Err(ParseError::new(format!("unknown updatability `{other}`"))),
		}
	}
}

/// A single typed property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
	/// String, id, html, or uri value.
	Text(String),
	/// Integer value.
	Integer(i64),
	/// Decimal value.
	Decimal(f64),
	/// Boolean value.
	Boolean(bool),
	/// Timestamp value.
	DateTime(OffsetDateTime),
}
impl Value {
	/// Returns the text payload, if any.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Value::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Returns the integer payload, if any.
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Value::Integer(value) => Some(*value),
			_ => None,
		}
	}

	/// Returns the decimal payload, widening integers.
	pub fn as_decimal(&self) -> Option<f64> {
		match self {
			Value::Decimal(value) => Some(*value),
			Value::Integer(value) => Some(*value as f64),
			_ => None,
		}
	}

	/// Returns the boolean payload, if any.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Boolean(value) => Some(*value),
			_ => None,
		}
	}

	/// Returns the timestamp payload, if any.
	pub fn as_datetime(&self) -> Option<OffsetDateTime> {
		match self {
			Value::DateTime(value) => Some(*value),
			_ => None,
		}
	}

	/// Converts a browser-binding JSON scalar into a value of type `ty`.
	///
	/// Timestamps are accepted both as epoch milliseconds and as ISO-8601 strings.
	pub fn from_json(ty: PropertyType, raw: &JsonValue) -> std::result::Result<Self, ParseError> {
		let mismatch = || ParseError::new(format!("expected a {} value but found `{raw}`", ty.as_str()));

		match ty {
			PropertyType::String | PropertyType::Id | PropertyType::Html | PropertyType::Uri =>
				match raw {
					JsonValue::String(text) => Ok(Value::Text(text.clone())),
					JsonValue::Number(number) => Ok(Value::Text(number.to_string())),
					JsonValue::Bool(flag) => Ok(Value::Text(flag.to_string())),
					_ => Err(mismatch()),
				},
			PropertyType::Integer => match raw {
				JsonValue::Number(number) => number.as_i64().map(Value::Integer).ok_or_else(mismatch),
				JsonValue::String(text) => Self::from_text(ty, text),
				_ => Err(mismatch()),
			},
			PropertyType::Decimal => match raw {
				JsonValue::Number(number) => number.as_f64().map(Value::Decimal).ok_or_else(mismatch),
				JsonValue::String(text) => Self::from_text(ty, text),
				_ => Err(mismatch()),
			},
			PropertyType::Boolean => match raw {
				JsonValue::Bool(flag) => Ok(Value::Boolean(*flag)),
				JsonValue::String(text) => Self::from_text(ty, text),
				_ => Err(mismatch()),
			},
			PropertyType::DateTime => match raw {
				JsonValue::Number(number) =>
					number.as_i64().ok_or_else(mismatch).and_then(datetime_from_millis),
				JsonValue::String(text) => Self::from_text(ty, text),
				_ => Err(mismatch()),
			},
		}
	}

	/// Converts an AtomPub text value into a value of type `ty`.
	pub fn from_text(ty: PropertyType, text: &str) -> std::result::Result<Self, ParseError> {
		let text = text.trim();
		let invalid = || ParseError::new(format!("`{text}` is not a valid {} value", ty.as_str()));

		match ty {
			PropertyType::String | PropertyType::Id | PropertyType::Html | PropertyType::Uri =>
				Ok(Value::Text(text.to_owned())),
			PropertyType::Integer => text.parse().map(Value::Integer).map_err(|_| invalid()),
			PropertyType::Decimal => text.parse().map(Value::Decimal).map_err(|_| invalid()),
			PropertyType::Boolean => match text {
				"true" => Ok(Value::Boolean(true)),
				"false" => Ok(Value::Boolean(false)),
				_ => Err(invalid()),
			},
			PropertyType::DateTime => {
				if let Ok(millis) = text.parse::<i64>() {
					return datetime_from_millis(millis);
				}

				OffsetDateTime::parse(text, &Rfc3339)
					.or_else(|_| OffsetDateTime::parse(text, &Iso8601::DEFAULT))
					.map(Value::DateTime)
					.map_err(|_| invalid())
			},
		}
	}

	/// Renders the value for browser-binding form posts; timestamps become epoch milliseconds.
	pub fn form_text(&self) -> String {
		match self {
			Value::Text(text) => text.clone(),
			Value::Integer(value) => value.to_string(),
			Value::Decimal(value) => value.to_string(),
			Value::Boolean(value) => value.to_string(),
			Value::DateTime(value) => (value.unix_timestamp_nanos() / 1_000_000).to_string(),
		}
	}

	/// Renders the value for AtomPub documents; timestamps become RFC 3339 strings.
	pub fn xml_text(&self) -> Result<String> {
		match self {
			Value::DateTime(value) => value
				.format(&Rfc3339)
				.map_err(|e| Error::invalid_argument(format!("timestamp cannot be formatted: {e}"))),
			other => Ok(other.form_text()),
		}
	}

	fn inferred_type(&self) -> PropertyType {
		match self {
			Value::Text(_) => PropertyType::String,
			Value::Integer(_) => PropertyType::Integer,
			Value::Decimal(_) => PropertyType::Decimal,
			Value::Boolean(_) => PropertyType::Boolean,
			Value::DateTime(_) => PropertyType::DateTime,
		}
	}
}
impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Text(value.to_owned())
	}
}
impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Text(value)
	}
}
impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Integer(value)
	}
}
impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Boolean(value)
	}
}
impl From<OffsetDateTime> for Value {
	fn from(value: OffsetDateTime) -> Self {
		Value::DateTime(value)
	}
}

/// Property payload respecting the declared cardinality.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
	/// Single-valued property; `None` when the repository reported no value.
	Single(Option<Value>),
	/// Multi-valued property.
	Multiple(Vec<Value>),
}
impl PropertyValue {
	/// Builds a value from browser JSON, honoring `cardinality`.
	pub fn from_json(
		ty: PropertyType,
		cardinality: Cardinality,
		raw: &JsonValue,
	) -> std::result::Result<Self, ParseError> {
		match (cardinality, raw) {
			(Cardinality::Multiple, JsonValue::Null) => Ok(PropertyValue::Multiple(Vec::new())),
			(Cardinality::Multiple, JsonValue::Array(items)) => items
				.iter()
				.map(|item| Value::from_json(ty, item))
				.collect::<std::result::Result<Vec<_>, _>>()
				.map(PropertyValue::Multiple),
			(Cardinality::Multiple, scalar) =>
				Ok(PropertyValue::Multiple(vec![Value::from_json(ty, scalar)?])),
			(Cardinality::Single, JsonValue::Null) => Ok(PropertyValue::Single(None)),
			(Cardinality::Single, JsonValue::Array(items)) => match items.as_slice() {
				[] | [JsonValue::Null] => Ok(PropertyValue::Single(None)),
				[item] => Ok(PropertyValue::Single(Some(Value::from_json(ty, item)?))),
				_ => Err(ParseError::new(format!(
					"single-valued property carried {} values",
					items.len()
				))),
			},
			(Cardinality::Single, scalar) =>
				Ok(PropertyValue::Single(Some(Value::from_json(ty, scalar)?))),
		}
	}

	/// Returns the first value, if any.
	pub fn first(&self) -> Option<&Value> {
		match self {
			PropertyValue::Single(value) => value.as_ref(),
			PropertyValue::Multiple(values) => values.first(),
		}
	}

	/// Returns every value as a slice (empty for an unset single value).
	pub fn values(&self) -> &[Value] {
		match self {
			PropertyValue::Single(Some(value)) => std::slice::from_ref(value),
			PropertyValue::Single(None) => &[],
			PropertyValue::Multiple(values) => values,
		}
	}

	/// Returns `true` for multi-valued payloads.
	pub fn is_multiple(&self) -> bool {
		matches!(self, PropertyValue::Multiple(_))
	}
}

/// A property entry with its metadata and value.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyData {
	/// Property definition identifier (e.g. `cmis:name`).
	pub id: String,
	/// Local name, when reported.
	pub local_name: Option<String>,
	/// Display name, when reported.
	pub display_name: Option<String>,
	/// Query name, when reported.
	pub query_name: Option<String>,
	/// Declared or inferred property type.
	pub property_type: PropertyType,
	/// Value payload.
	pub value: PropertyValue,
}
impl PropertyData {
	/// Creates a property with the given type and payload.
	pub fn new(id: impl Into<String>, property_type: PropertyType, value: PropertyValue) -> Self {
		Self {
			id: id.into(),
			local_name: None,
			display_name: None,
			query_name: None,
			property_type,
			value,
		}
	}

	/// Creates a single-valued property, using the core property type when `id` names one.
	pub fn single(id: impl Into<String>, value: impl Into<Value>) -> Self {
		let id = id.into();
		let value = value.into();
		let property_type = property_ids::core_property_shape(&id)
			.map(|(ty, _)| ty)
			.unwrap_or_else(|| value.inferred_type());

		Self::new(id, property_type, PropertyValue::Single(Some(value)))
	}

	/// Creates a multi-valued property of the given type.
	pub fn multiple(id: impl Into<String>, property_type: PropertyType, values: Vec<Value>) -> Self {
		Self::new(id, property_type, PropertyValue::Multiple(values))
	}

	/// Builds a property from browser JSON without a type definition.
	///
	/// Core properties use their fixed shape; everything else is inferred from the JSON value.
	pub fn inferred_from_json(id: &str, raw: &JsonValue) -> std::result::Result<Self, ParseError> {
		if let Some((ty, cardinality)) = property_ids::core_property_shape(id) {
			return Ok(Self::new(id, ty, PropertyValue::from_json(ty, cardinality, raw)?));
		}

		let (ty, cardinality) = match raw {
			JsonValue::Array(items) =>
				(items.iter().find(|item| !item.is_null()).map_or(PropertyType::String, infer_json_type), Cardinality::Multiple),
			other => (infer_json_type(other), Cardinality::Single),
		};

		Ok(Self::new(id, ty, PropertyValue::from_json(ty, cardinality, raw)?))
	}
}

/// Ordered property collection keyed by property definition id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties(IndexMap<String, PropertyData>);
impl Properties {
	/// Creates an empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a property, keeping the original position on replace.
	pub fn insert(&mut self, property: PropertyData) {
		self.0.insert(property.id.clone(), property);
	}

	/// Builder-style [`Properties::insert`].
	pub fn with(mut self, property: PropertyData) -> Self {
		self.insert(property);

		self
	}

	/// Looks up a property by id.
	pub fn get(&self, id: &str) -> Option<&PropertyData> {
		self.0.get(id)
	}

	/// First value of a property.
	pub fn value(&self, id: &str) -> Option<&Value> {
		self.get(id).and_then(|p| p.value.first())
	}

	/// First text value of a property.
	pub fn text(&self, id: &str) -> Option<&str> {
		self.value(id).and_then(Value::as_text)
	}

	/// First integer value of a property.
	pub fn integer(&self, id: &str) -> Option<i64> {
		self.value(id).and_then(Value::as_integer)
	}

	/// First boolean value of a property.
	pub fn boolean(&self, id: &str) -> Option<bool> {
		self.value(id).and_then(Value::as_bool)
	}

	/// First timestamp value of a property.
	pub fn datetime(&self, id: &str) -> Option<OffsetDateTime> {
		self.value(id).and_then(Value::as_datetime)
	}

	/// All text values of a property (empty when absent).
	pub fn texts(&self, id: &str) -> Vec<&str> {
		self.get(id)
			.map(|p| p.value.values().iter().filter_map(Value::as_text).collect())
			.unwrap_or_default()
	}

	/// Returns `true` when a property with `id` exists.
	pub fn contains(&self, id: &str) -> bool {
		self.0.contains_key(id)
	}

	/// Iterates properties in repository order.
	pub fn iter(&self) -> impl Iterator<Item = &PropertyData> {
		self.0.values()
	}

	/// Number of properties.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the collection is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl FromIterator<PropertyData> for Properties {
	fn from_iter<I: IntoIterator<Item = PropertyData>>(iter: I) -> Self {
		let mut properties = Self::new();

		iter.into_iter().for_each(|p| properties.insert(p));

		properties
	}
}

fn infer_json_type(raw: &JsonValue) -> PropertyType {
	match raw {
		JsonValue::Bool(_) => PropertyType::Boolean,
		JsonValue::Number(number) if number.is_i64() || number.is_u64() => PropertyType::Integer,
		JsonValue::Number(_) => PropertyType::Decimal,
		_ => PropertyType::String,
	}
}

fn datetime_from_millis(millis: i64) -> std::result::Result<Value, ParseError> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
		.map(Value::DateTime)
		.map_err(|_| ParseError::new(format!("timestamp {millis} is out of range")))
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn datetime_accepts_millis_and_iso_strings() {
		let from_millis = Value::from_json(PropertyType::DateTime, &json!(1_330_596_000_000_i64))
			.expect("Millisecond timestamps should parse.");
		let from_iso = Value::from_json(PropertyType::DateTime, &json!("2012-03-01T10:00:00Z"))
			.expect("ISO timestamps should parse.");

		assert_eq!(from_millis, Value::DateTime(datetime!(2012-03-01 10:00 UTC)));
		assert_eq!(from_millis, from_iso);
		assert_eq!(from_millis.form_text(), "1330596000000");
	}

	#[test]
	fn multiple_cardinality_wraps_scalars_and_keeps_order() {
		let listed = PropertyValue::from_json(
			PropertyType::Id,
			Cardinality::Multiple,
			&json!(["P:cm:titled", "P:sys:localized"]),
		)
		.expect("Multi-valued arrays should parse.");
		let scalar = PropertyValue::from_json(PropertyType::Id, Cardinality::Multiple, &json!("P:x"))
			.expect("Scalars should widen into lists.");

		assert_eq!(listed.values().len(), 2);
		assert_eq!(listed.values()[1].as_text(), Some("P:sys:localized"));
		assert_eq!(scalar, PropertyValue::Multiple(vec![Value::Text("P:x".into())]));
	}

	#[test]
	fn single_cardinality_rejects_multiple_values() {
		let err = PropertyValue::from_json(PropertyType::String, Cardinality::Single, &json!(["a", "b"]))
			.expect_err("Two values for a single-valued property must fail.");

		assert!(err.reason.contains("single-valued"));
		assert_eq!(
			PropertyValue::from_json(PropertyType::String, Cardinality::Single, &json!(null))
				.expect("Null should map to an unset value."),
			PropertyValue::Single(None)
		);
	}

	#[test]
	fn inference_uses_core_shapes_before_json_shapes() {
		let created = PropertyData::inferred_from_json(
			property_ids::CREATION_DATE,
			&json!(1_330_596_000_000_i64),
		)
		.expect("Core timestamp should parse.");
		let custom = PropertyData::inferred_from_json("acme:rating", &json!(4.5))
			.expect("Custom decimal should parse.");

		assert_eq!(created.property_type, PropertyType::DateTime);
		assert_eq!(custom.property_type, PropertyType::Decimal);
		assert_eq!(custom.value.first().and_then(Value::as_decimal), Some(4.5));
	}

	#[test]
	fn properties_preserve_insertion_order() {
		let properties = Properties::new()
			.with(PropertyData::single(property_ids::NAME, "report.pdf"))
			.with(PropertyData::single(property_ids::OBJECT_TYPE_ID, "cmis:document"))
			.with(PropertyData::single("acme:pages", 12_i64));
		let ids = properties.iter().map(|p| p.id.as_str()).collect::<Vec<_>>();

		assert_eq!(ids, ["cmis:name", "cmis:objectTypeId", "acme:pages"]);
		assert_eq!(properties.get(property_ids::OBJECT_TYPE_ID).map(|p| p.property_type), Some(PropertyType::Id));
		assert_eq!(properties.integer("acme:pages"), Some(12));
	}
}
