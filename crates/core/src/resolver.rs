//! Address-bar input resolution.
//!
//! Turns free-form text into a concrete navigation URL without any network
//! lookup. Rules are applied in order, first match wins:
//!
//! 1. explicit `http://`/`https://` scheme, or anything mentioning `localhost`
//! 2. bare domain: contains a `.` and no whitespace
//! 3. search query through the configured template

use serde::Serialize;

use crate::config::{DEFAULT_SEARCH_TEMPLATE, QUERY_PLACEHOLDER};

/// Which rule produced a [`Resolved`] URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
	/// Already carried an http(s) scheme.
	Url,
	/// Local development host, `http://` prefixed.
	Localhost,
	/// Bare domain, `https://` prefixed.
	Domain,
	/// Free text sent to the search engine.
	Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
	pub url: String,
	pub kind: InputKind,
}

#[derive(Debug, Clone)]
pub struct NavigationResolver {
	search_template: String,
}

impl Default for NavigationResolver {
	fn default() -> Self {
		Self::new(DEFAULT_SEARCH_TEMPLATE)
	}
}

impl NavigationResolver {
	pub fn new(search_template: impl Into<String>) -> Self {
		Self {
			search_template: search_template.into(),
		}
	}

	/// Resolves raw input, or `None` when it is blank.
	pub fn resolve(&self, raw: &str) -> Option<Resolved> {
		let input = raw.trim();
		if input.is_empty() {
			return None;
		}

		let has_scheme = starts_with_ignore_case(input, "http://") || starts_with_ignore_case(input, "https://");
		if has_scheme {
			return Some(Resolved {
				url: input.to_string(),
				kind: InputKind::Url,
			});
		}

		if input.to_ascii_lowercase().contains("localhost") {
			if input.contains("://") {
				return Some(Resolved {
					url: input.to_string(),
					kind: InputKind::Url,
				});
			}
			return Some(Resolved {
				url: format!("http://{input}"),
				kind: InputKind::Localhost,
			});
		}

		if input.contains('.') && !input.chars().any(char::is_whitespace) {
			return Some(Resolved {
				url: format!("https://{input}"),
				kind: InputKind::Domain,
			});
		}

		Some(Resolved {
			url: self.search_url(input),
			kind: InputKind::Search,
		})
	}

	fn search_url(&self, query: &str) -> String {
		self.search_template.replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
	}
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
	s.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
