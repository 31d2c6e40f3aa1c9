//! Canonical query-string encoding for outbound API requests.
//!
//! Parameters serialize in ascending key order regardless of insertion order,
//! with keys and values lower-cased on entry. Many HTTP intermediaries
//! canonicalize or redirect on query content, so identical logical requests
//! must stay byte-identical on the wire. Request-shape types implement
//! [`QueryModel`] to map their populated fields onto a [`QueryParams`] value
//! without per-endpoint boilerplate.

// std
use std::collections::{BTreeMap, btree_map};
// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
// self
use crate::_prelude::*;

/// Characters escaped inside query components; the RFC 3986 unreserved set
/// stays literal, everything else (including `,`) is percent-encoded.
const QUERY_COMPONENT: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Deterministically ordered set of query parameters.
///
/// Keys are unique; inserting an existing key replaces its value. Both keys
/// and values are lower-cased when they enter the set, matching the
/// case-folding the serialization contract requires.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);
impl QueryParams {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a key/value pair, lower-casing both components.
	///
	/// Returns the previous value when the key was already present.
	pub fn insert(&mut self, key: impl AsRef<str>, value: impl ToString) -> Option<String> {
		self.0.insert(key.as_ref().to_lowercase(), value.to_string().to_lowercase())
	}

	/// Inserts a value only when it is present; absent values are skipped.
	pub fn insert_opt(&mut self, key: impl AsRef<str>, value: Option<impl ToString>) {
		if let Some(value) = value {
			self.insert(key, value);
		}
	}

	/// Joins an ordered sequence with commas into a single value.
	///
	/// Empty sequences are skipped entirely so the key never appears.
	pub fn insert_seq<I>(&mut self, key: impl AsRef<str>, values: I)
	where
		I: IntoIterator,
		I::Item: ToString,
	{
		let joined =
			values.into_iter().map(|value| value.to_string()).collect::<Vec<_>>().join(",");

		if !joined.is_empty() {
			self.insert(key, joined);
		}
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, key: impl AsRef<str>, value: impl ToString) -> Self {
		self.insert(key, value);

		self
	}

	/// Builder-style [`insert_seq`](Self::insert_seq).
	pub fn with_seq<I>(mut self, key: impl AsRef<str>, values: I) -> Self
	where
		I: IntoIterator,
		I::Item: ToString,
	{
		self.insert_seq(key, values);

		self
	}

	/// Returns the value stored under a key, after case-folding the lookup key.
	pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
		self.0.get(&key.as_ref().to_lowercase()).map(String::as_str)
	}

	/// Returns the number of stored parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no parameters are stored.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates pairs in serialization (ascending key) order.
	pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
		self.0.iter()
	}

	/// Serializes the set into its canonical query-string form.
	///
	/// An empty set yields an empty string; otherwise a leading `?` followed by
	/// `&`-joined `key=value` pairs in ascending key order, each component
	/// percent-encoded.
	pub fn encode(&self) -> String {
		let mut buf = String::new();

		for (key, value) in &self.0 {
			buf.push(if buf.is_empty() { '?' } else { '&' });
			buf.extend(utf8_percent_encode(key, QUERY_COMPONENT));
			buf.push('=');
			buf.extend(utf8_percent_encode(value, QUERY_COMPONENT));
		}

		buf
	}
}
impl Display for QueryParams {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.encode())
	}
}
impl<K, V> FromIterator<(K, V)> for QueryParams
where
	K: AsRef<str>,
	V: ToString,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut params = Self::new();

		for (key, value) in iter {
			params.insert(key, value);
		}

		params
	}
}

/// Compile-time bridge between request-shape types and the flat wire format.
///
/// Implementations list their populated fields explicitly (external key,
/// value, omit-if-empty rule) instead of relying on runtime introspection:
///
/// ```
/// use throttle_client::query::{QueryModel, QueryParams};
///
/// struct DiscoverFilter {
/// 	kind: &'static str,
/// 	languages: Vec<&'static str>,
/// 	page: Option<u32>,
/// }
/// impl QueryModel for DiscoverFilter {
/// 	fn query_params(&self) -> QueryParams {
/// 		let mut params = QueryParams::new().with("type", self.kind);
///
/// 		params.insert_seq("languages", &self.languages);
/// 		params.insert_opt("page", self.page);
///
/// 		params
/// 	}
/// }
///
/// let filter = DiscoverFilter { kind: "Movie", languages: vec!["en", "pt"], page: None };
///
/// assert_eq!(filter.query_params().encode(), "?languages=en%2Cpt&type=movie");
/// ```
pub trait QueryModel {
	/// Maps the value's populated fields onto their external query keys.
	fn query_params(&self) -> QueryParams;
}
impl<T: QueryModel> From<&T> for QueryParams {
	fn from(model: &T) -> Self {
		model.query_params()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::BTreeMap;
	// self
	use super::*;

	// Inverse parser used only to verify the round-trip property.
	fn decode_query(encoded: &str) -> BTreeMap<String, String> {
		let Some(stripped) = encoded.strip_prefix('?') else {
			assert!(encoded.is_empty(), "Encoded string must be empty or start with `?`.");

			return BTreeMap::new();
		};

		stripped
			.split('&')
			.map(|pair| {
				let (key, value) =
					pair.split_once('=').expect("Every encoded pair must contain `=`.");
				let decode = |component: &str| {
					percent_encoding::percent_decode_str(component)
						.decode_utf8()
						.expect("Encoded components must stay valid UTF-8.")
						.into_owned()
				};

				(decode(key), decode(value))
			})
			.collect()
	}

	#[test]
	fn empty_set_encodes_to_empty_string() {
		assert_eq!(QueryParams::new().encode(), "");
	}

	#[test]
	fn keys_serialize_in_ascending_order_regardless_of_insertion() {
		let forward = QueryParams::new().with("alpha", 1).with("mid", 2).with("zulu", 3);
		let reverse = QueryParams::new().with("zulu", 3).with("mid", 2).with("alpha", 1);

		assert_eq!(forward.encode(), "?alpha=1&mid=2&zulu=3");
		assert_eq!(forward, reverse);
	}

	#[test]
	fn keys_and_values_are_case_folded() {
		let params = QueryParams::new().with("Type", "Movie");

		assert_eq!(params.encode(), "?type=movie");
		assert_eq!(params.get("TYPE"), Some("movie"));
	}

	#[test]
	fn duplicate_keys_keep_the_latest_value() {
		let mut params = QueryParams::new();

		assert_eq!(params.insert("page", 1), None);
		assert_eq!(params.insert("Page", 2), Some("1".into()));
		assert_eq!(params.encode(), "?page=2");
	}

	#[test]
	fn sequences_join_with_commas_and_skip_empty() {
		let mut params = QueryParams::new();

		params.insert_seq("languages", ["en", "pt"]);
		params.insert_seq("formats", Vec::<&str>::new());

		assert_eq!(params.encode(), "?languages=en%2Cpt");
	}

	#[test]
	fn absent_values_are_skipped() {
		let mut params = QueryParams::new();

		params.insert_opt("page", Some(3));
		params.insert_opt("year", None::<u32>);

		assert_eq!(params.encode(), "?page=3");
	}

	#[test]
	fn reserved_characters_are_percent_encoded() {
		let params = QueryParams::new().with("query", "spirited away & more");

		assert_eq!(params.encode(), "?query=spirited%20away%20%26%20more");
	}

	#[test]
	fn encoding_round_trips_through_the_inverse_parser() {
		let params = QueryParams::new()
			.with("Type", "Movie")
			.with("query", "a & b = c")
			.with_seq("languages", ["en", "pt-BR"]);
		let decoded = decode_query(&params.encode());
		let expected: BTreeMap<String, String> =
			params.iter().map(|(key, value)| (key.clone(), value.clone())).collect();

		assert_eq!(decoded, expected);
	}

	#[test]
	fn query_model_bridges_structured_filters() {
		struct Filter {
			kind: &'static str,
			languages: Vec<&'static str>,
		}
		impl QueryModel for Filter {
			fn query_params(&self) -> QueryParams {
				QueryParams::new().with("Type", self.kind).with_seq("Languages", &self.languages)
			}
		}

		let filter = Filter { kind: "Movie", languages: vec!["en", "pt"] };
		let params = QueryParams::from(&filter);

		assert_eq!(params.encode(), "?languages=en%2Cpt&type=movie");
	}
}
