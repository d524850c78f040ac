//! Data models for aggregated news and subscription requests.
//!
//! This module defines the wire and in-memory structures shared by the
//! controllers and the HTTP providers:
//! - [`NewsArticle`]: A single aggregated article
//! - [`NewsResponse`]: Articles grouped by category, in server order
//! - [`NewsEnvelope`]: The full `GET /api/news` body
//! - [`SubscriptionRequest`] / [`SubscriptionReply`]: `POST /api/subscriptions` bodies
//!
//! The server speaks camelCase JSON, so the models rename their fields
//! with serde rather than carrying camelCase Rust names.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single aggregated news item.
///
/// Articles are immutable once received; the controllers only ever replace
/// whole [`NewsResponse`] values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    /// The article headline.
    pub title: String,
    /// Link to the original story.
    pub url: String,
    /// Publication timestamp as sent by the server (ISO 8601, zone optional).
    pub published_at: String,
    /// Optional lead image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Category label, e.g. `"Technology"`.
    pub category: String,
    /// Short description, when the upstream feed supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Name of the publishing outlet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Articles grouped by category name.
///
/// Unlike a `HashMap`, this keeps categories in the order the server sent
/// them, which is the order the "all" view concatenates them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsResponse {
    groups: Vec<(String, Vec<NewsArticle>)>,
}

impl NewsResponse {
    /// Build a response from `(category, articles)` pairs, keeping their order.
    ///
    /// A repeated category appends to the earlier group instead of creating a
    /// second key.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<NewsArticle>)>,
    {
        let mut response = Self::default();
        for (category, articles) in groups {
            response.push_group(category, articles);
        }
        response
    }

    fn push_group(&mut self, category: String, articles: Vec<NewsArticle>) {
        match self.groups.iter_mut().find(|(key, _)| *key == category) {
            Some((_, existing)) => existing.extend(articles),
            None => self.groups.push((category, articles)),
        }
    }

    /// Category names in server order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(key, _)| key.as_str())
    }

    /// Iterate over `(category, articles)` pairs in server order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[NewsArticle])> {
        self.groups
            .iter()
            .map(|(key, articles)| (key.as_str(), articles.as_slice()))
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of articles across all categories.
    pub fn total_articles(&self) -> usize {
        self.groups.iter().map(|(_, articles)| articles.len()).sum()
    }
}

impl Serialize for NewsResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (category, articles) in &self.groups {
            map.serialize_entry(category, articles)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NewsResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = NewsResponse;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from category name to a list of articles")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut response = NewsResponse::default();
                while let Some((category, articles)) =
                    access.next_entry::<String, Vec<NewsArticle>>()?
                {
                    response.push_group(category, articles);
                }
                Ok(response)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Body of `GET /api/news`.
///
/// The totals are informational; the client recomputes them from `news`
/// when it needs them. `news` itself is required: a body without it is a
/// decode error, not an empty aggregation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsEnvelope {
    #[serde(default)]
    pub total_categories: Option<usize>,
    #[serde(default)]
    pub total_articles: Option<usize>,
    pub news: NewsResponse,
}

/// Body of `POST /api/subscriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionRequest {
    pub email: String,
    pub categories: Vec<String>,
}

/// Reply to a subscription request. The server may omit the message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionReply {
    #[serde(default)]
    pub message: Option<String>,
}
