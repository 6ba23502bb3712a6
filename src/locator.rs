//! Resolution of the account → property → view hierarchy.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::client::{list_items, ServiceCall};
use crate::error::{ReportError, Result};
use crate::ids::validate_id;
use crate::models::HierarchyEntry;

/// A level of the reporting hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyLevel {
    Account,
    Property,
    View,
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HierarchyLevel::Account => "account",
            HierarchyLevel::Property => "property",
            HierarchyLevel::View => "view",
        })
    }
}

/// A fully specified reporting view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    account_id: String,
    web_property_id: String,
    profile_id: String,
}

impl ResourceRef {
    /// Create a reference, checking that every component is a usable ID.
    pub fn new(
        account_id: impl Into<String>,
        web_property_id: impl Into<String>,
        profile_id: impl Into<String>,
    ) -> Result<Self> {
        let account_id = account_id.into();
        let web_property_id = web_property_id.into();
        let profile_id = profile_id.into();

        validate_id("account", &account_id)?;
        validate_id("property", &web_property_id)?;
        validate_id("view", &profile_id)?;

        Ok(Self {
            account_id,
            web_property_id,
            profile_id,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn web_property_id(&self) -> &str {
        &self.web_property_id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    /// Management API path of the view.
    pub fn profile_path(&self) -> String {
        format!(
            "management/accounts/{}/webproperties/{}/profiles/{}",
            self.account_id, self.web_property_id, self.profile_id
        )
    }

    /// Management API path of the view's unsampled reports.
    pub fn reports_path(&self) -> String {
        format!("{}/unsampledReports", self.profile_path())
    }

    /// Management API path of one unsampled report.
    pub fn report_path(&self, report_id: &str) -> Result<String> {
        let report_id = validate_id("report", report_id)?;
        Ok(format!("{}/{}", self.reports_path(), report_id))
    }

    /// Table ID for the Core Reporting API.
    pub fn ga_ids(&self) -> String {
        format!("ga:{}", self.profile_id)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.account_id, self.web_property_id, self.profile_id
        )
    }
}

/// A view reference with optional components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRef {
    pub account_id: Option<String>,
    pub web_property_id: Option<String>,
    pub profile_id: Option<String>,
}

/// How one entry is chosen from a hierarchy listing.
#[derive(Clone, Default)]
pub enum Pick {
    /// The first entry in server order.
    #[default]
    First,
    /// The entry at a zero-based position.
    Index(usize),
    /// The entry whose ID or name equals the given value.
    Named(String),
    /// The first entry accepted by the predicate.
    Matching(Arc<dyn Fn(&HierarchyEntry) -> bool + Send + Sync>),
}

impl fmt::Debug for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pick::First => f.write_str("First"),
            Pick::Index(i) => f.debug_tuple("Index").field(i).finish(),
            Pick::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Pick::Matching(_) => f.write_str("Matching(..)"),
        }
    }
}

impl Pick {
    /// Build a predicate pick.
    pub fn matching<F>(predicate: F) -> Self
    where
        F: Fn(&HierarchyEntry) -> bool + Send + Sync + 'static,
    {
        Pick::Matching(Arc::new(predicate))
    }

    pub fn choose<'a>(&self, entries: &'a [HierarchyEntry]) -> Option<&'a HierarchyEntry> {
        match self {
            Pick::First => entries.first(),
            Pick::Index(index) => entries.get(*index),
            Pick::Named(value) => entries
                .iter()
                .find(|e| e.id == *value || e.name.as_deref() == Some(value.as_str())),
            Pick::Matching(predicate) => entries.iter().find(|e| predicate(e)),
        }
    }
}

impl FromStr for Pick {
    type Err = String;

    /// Parse `first`, a zero-based index, or `name:<value>`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("first") {
            return Ok(Pick::First);
        }
        if let Some(name) = s.strip_prefix("name:") {
            if name.is_empty() {
                return Err("`name:` needs a value".to_string());
            }
            return Ok(Pick::Named(name.to_string()));
        }
        s.parse::<usize>()
            .map(Pick::Index)
            .map_err(|_| format!("expected `first`, an index or `name:<value>`, got {:?}", s))
    }
}

/// Selection strategy for each hierarchy level.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub account: Pick,
    pub property: Pick,
    pub view: Pick,
}

impl Selection {
    /// Use the same pick at every level.
    pub fn uniform(pick: Pick) -> Self {
        Self {
            account: pick.clone(),
            property: pick.clone(),
            view: pick,
        }
    }
}

async fn pick_entry<S: ServiceCall>(
    service: &S,
    path: &str,
    level: HierarchyLevel,
    pick: &Pick,
) -> Result<String> {
    let entries: Vec<HierarchyEntry> = list_items(service, path).await?;
    let chosen = pick
        .choose(&entries)
        .ok_or(ReportError::NotFound { level })?;
    debug!(%level, id = %chosen.id, candidates = entries.len(), "selected hierarchy entry");
    Ok(chosen.id.clone())
}

/// Resolve the default view by descending from the accounts list.
pub async fn resolve_default_view<S: ServiceCall>(
    service: &S,
    selection: &Selection,
) -> Result<ResourceRef> {
    resolve(service, &PartialRef::default(), selection).await
}

/// Fill the missing components of `partial` by walking the hierarchy.
///
/// Components that are already present are used as given and their level is not listed.
pub async fn resolve<S: ServiceCall>(
    service: &S,
    partial: &PartialRef,
    selection: &Selection,
) -> Result<ResourceRef> {
    let account_id = match &partial.account_id {
        Some(id) => id.clone(),
        None => {
            pick_entry(
                service,
                "management/accounts",
                HierarchyLevel::Account,
                &selection.account,
            )
            .await?
        }
    };

    let web_property_id = match &partial.web_property_id {
        Some(id) => id.clone(),
        None => {
            let path = format!(
                "management/accounts/{}/webproperties",
                validate_id("account", &account_id)?
            );
            pick_entry(service, &path, HierarchyLevel::Property, &selection.property).await?
        }
    };

    let profile_id = match &partial.profile_id {
        Some(id) => id.clone(),
        None => {
            let path = format!(
                "management/accounts/{}/webproperties/{}/profiles",
                validate_id("account", &account_id)?,
                validate_id("property", &web_property_id)?
            );
            pick_entry(service, &path, HierarchyLevel::View, &selection.view).await?
        }
    };

    ResourceRef::new(account_id, web_property_id, profile_id)
}
