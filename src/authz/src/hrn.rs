//! HRN (Hypto Resource Name) types
//!
//! Resource HRNs render in one of four forms:
//!
//! 1. `hrn:<organizationId>`
//! 2. `hrn:<organizationId>:<subOrganizationId>`
//! 3. `hrn:<organizationId>::<resourceType>/<resourceInstance>`
//! 4. `hrn:<organizationId>:<subOrganizationId>:<resourceType>/<resourceInstance>`
//!
//! Only forms 3 and 4 parse; the first two are produced by [`ResourceHrn::organization`]
//! and friends for display.
//!
//! Action HRNs name an operation on a resource type:
//! `hrn:<organizationId>:<subOrganizationId>:<resourceType>$<action>`.
//!
//! [`Hrn::parse`] accepts either kind.

use crate::error::HrnError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

pub const HRN_PREFIX: &str = "hrn:";
pub const HRN_DELIMITER: char = ':';
pub const HRN_ACTION_DELIMITER: char = '$';
pub const HRN_INSTANCE_DELIMITER: char = '/';

static RESOURCE_HRN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^hrn:(?P<organization>[^:\n$]+):(?P<sub_organization>[^:\n$]*):(?P<resource>[^:/\n$]*)/?(?P<instance>[^/\n:$]*)$",
    )
    .expect("resource hrn regex is valid")
});

static ACTION_HRN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^hrn:(?P<organization>[^:\n$]+):(?P<sub_organization>[^:\n$]*):(?P<resource>[^:/\n$]*)\$(?P<action>[^/\n:]*)$",
    )
    .expect("action hrn regex is valid")
});

fn non_empty(value: Option<regex::Match<'_>>) -> Option<String> {
    value
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// HRN identifying an organization, sub-organization or resource instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHrn {
    pub organization: String,
    pub sub_organization: Option<String>,
    pub resource: Option<String>,
    pub resource_instance: Option<String>,
}

impl ResourceHrn {
    /// HRN of a resource instance, e.g. `hrn:acme::iam-user/alice`
    pub fn new(
        organization: impl Into<String>,
        sub_organization: Option<String>,
        resource: impl Into<String>,
        resource_instance: Option<String>,
    ) -> Result<Self, HrnError> {
        let organization = organization.into();
        let resource = resource.into();
        if resource.is_empty() {
            return Err(HrnError::InvalidResourceHrn(format!(
                "{}{}: empty resource",
                HRN_PREFIX, organization
            )));
        }

        Ok(Self {
            organization,
            sub_organization: sub_organization.filter(|s| !s.is_empty()),
            resource: Some(resource),
            resource_instance: resource_instance.filter(|s| !s.is_empty()),
        })
    }

    /// HRN of an organization, e.g. `hrn:acme`
    pub fn organization(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            sub_organization: None,
            resource: None,
            resource_instance: None,
        }
    }

    /// Prefix every statement of this organization's policies must start with
    pub fn organization_prefix(&self) -> String {
        format!("{}{}", HRN_PREFIX, self.organization)
    }
}

impl FromStr for ResourceHrn {
    type Err = HrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RESOURCE_HRN_REGEX
            .captures(s)
            .ok_or_else(|| HrnError::InvalidResourceHrn(s.to_string()))?;

        Ok(Self {
            organization: caps["organization"].to_string(),
            sub_organization: non_empty(caps.name("sub_organization")),
            resource: non_empty(caps.name("resource")),
            resource_instance: non_empty(caps.name("instance")),
        })
    }
}

impl fmt::Display for ResourceHrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", HRN_PREFIX, self.organization)?;

        if self.sub_organization.is_none() && self.resource.is_none() {
            return Ok(());
        }

        write!(
            f,
            "{}{}",
            HRN_DELIMITER,
            self.sub_organization.as_deref().unwrap_or("")
        )?;

        if let Some(resource) = &self.resource {
            write!(f, "{}{}", HRN_DELIMITER, resource)?;
            if let Some(instance) = &self.resource_instance {
                write!(f, "{}{}", HRN_INSTANCE_DELIMITER, instance)?;
            }
        }

        Ok(())
    }
}

/// HRN naming an action on a resource type, e.g. `hrn:acme::invoice$view`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionHrn {
    pub organization: String,
    pub sub_organization: Option<String>,
    pub resource: Option<String>,
    pub action: Option<String>,
}

impl ActionHrn {
    pub fn new(
        organization: impl Into<String>,
        sub_organization: Option<String>,
        resource: Option<String>,
        action: Option<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            sub_organization: sub_organization.filter(|s| !s.is_empty()),
            resource: resource.filter(|s| !s.is_empty()),
            action: action.filter(|s| !s.is_empty()),
        }
    }
}

impl FromStr for ActionHrn {
    type Err = HrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = ACTION_HRN_REGEX
            .captures(s)
            .ok_or_else(|| HrnError::InvalidActionHrn(s.to_string()))?;

        Ok(Self {
            organization: caps["organization"].to_string(),
            sub_organization: non_empty(caps.name("sub_organization")),
            resource: non_empty(caps.name("resource")),
            action: non_empty(caps.name("action")),
        })
    }
}

impl fmt::Display for ActionHrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}{}",
            HRN_PREFIX,
            self.organization,
            HRN_DELIMITER,
            self.sub_organization.as_deref().unwrap_or(""),
            HRN_DELIMITER,
            self.resource.as_deref().unwrap_or("")
        )?;
        if let Some(action) = &self.action {
            write!(f, "{}{}", HRN_ACTION_DELIMITER, action)?;
        }
        Ok(())
    }
}

/// Either kind of HRN
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Hrn {
    Resource(ResourceHrn),
    Action(ActionHrn),
}

impl Hrn {
    /// Parse an action HRN if the string has an action part, a resource HRN otherwise
    pub fn parse(s: &str) -> Result<Self, HrnError> {
        if ACTION_HRN_REGEX.is_match(s) {
            s.parse().map(Hrn::Action)
        } else if RESOURCE_HRN_REGEX.is_match(s) {
            s.parse().map(Hrn::Resource)
        } else {
            Err(HrnError::InvalidHrn(s.to_string()))
        }
    }

    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn organization(&self) -> &str {
        match self {
            Hrn::Resource(hrn) => &hrn.organization,
            Hrn::Action(hrn) => &hrn.organization,
        }
    }
}

impl FromStr for Hrn {
    type Err = HrnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Hrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hrn::Resource(hrn) => fmt::Display::fmt(hrn, f),
            Hrn::Action(hrn) => fmt::Display::fmt(hrn, f),
        }
    }
}
