//! Cookie records installed into session partitions.
//!
//! [`Cookie`] is the normalized form handed to a credential injector.
//! [`PageCookie`] is the browser-cookie shape embedded pages post through the
//! inbound channel and converts into a [`Cookie`].

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
///
/// See: https://developer.mozilla.org/en-US/docs/Web/HTTP/Headers/Set-Cookie/SameSite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	/// Sent with same-site and cross-site requests
	#[serde(rename = "None")]
	None,
	/// Sent with same-site requests and cross-site top-level navigations
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	/// Only sent with same-site requests
	#[serde(rename = "Strict")]
	Strict,
}

/// A cookie to be installed into one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,

	pub value: String,

	/// Either domain or url must be specified.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,

	/// Unix timestamp in seconds. -1 means session cookie.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,

	/// URL to infer domain and path from.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

impl Cookie {
	/// Creates a cookie scoped to `domain`.
	pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: Some(domain.into()),
			path: None,
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
			url: None,
		}
	}

	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	pub fn http_only(mut self, http_only: bool) -> Self {
		self.http_only = Some(http_only);
		self
	}

	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = Some(secure);
		self
	}

	pub fn same_site(mut self, same_site: SameSite) -> Self {
		self.same_site = Some(same_site);
		self
	}

	/// Returns true when the cookie names a domain or url to attach to.
	pub fn is_addressable(&self) -> bool {
		self.domain.as_deref().is_some_and(|d| !d.is_empty()) || self.url.as_deref().is_some_and(|u| !u.is_empty())
	}
}

/// Cookie as serialized by the embedded page's browser cookie API.
///
/// Field naming follows the page side (`expirationDate`, `hostOnly`, lowercase
/// `sameSite`). Use [`to_cookie`](Self::to_cookie) for conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCookie {
	pub name: String,
	pub value: String,
	/// May have a leading dot for domain cookies.
	#[serde(default)]
	pub domain: String,
	#[serde(default = "default_path")]
	pub path: String,
	/// Unix timestamp in seconds, [`None`] for session cookies.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expiration_date: Option<f64>,
	#[serde(default)]
	pub http_only: bool,
	#[serde(default)]
	pub secure: bool,
	/// `"lax"`, `"strict"`, `"no_restriction"` or `"unspecified"`.
	#[serde(default)]
	pub same_site: String,
	#[serde(default)]
	pub host_only: bool,
}

fn default_path() -> String {
	"/".to_string()
}

impl PageCookie {
	/// Converts to the normalized [`Cookie`] form.
	///
	/// Session cookies get `expires = -1`; unknown `sameSite` values map to `Lax`.
	pub fn to_cookie(&self) -> Cookie {
		let mut cookie = Cookie::new(&self.name, &self.value, &self.domain)
			.path(&self.path)
			.http_only(self.http_only)
			.secure(self.secure)
			.same_site(self.parse_same_site());
		if self.domain.is_empty() {
			cookie.domain = None;
		}
		cookie.expires = self.expiration_date.or(Some(-1.0));
		cookie
	}

	fn parse_same_site(&self) -> SameSite {
		match self.same_site.to_ascii_lowercase().as_str() {
			"strict" => SameSite::Strict,
			"no_restriction" | "none" => SameSite::None,
			_ => SameSite::Lax,
		}
	}
}
