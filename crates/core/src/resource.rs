//! Catalog of list/CRUD endpoints exposed by the administration backend.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::guard::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Resource {
    Organizations,
    Users,
    /// RADIUS clients (routers, access points).
    Nas,
    RadiusProfiles,
    Packages,
    Vouchers,
    VoucherBatches,
    /// MikroTik hotspot MAC/IP bindings.
    IpBindings,
    Advertisements,
    LogArchives,
}

impl Resource {
    pub const ALL: &'static [Resource] = &[
        Resource::Organizations,
        Resource::Users,
        Resource::Nas,
        Resource::RadiusProfiles,
        Resource::Packages,
        Resource::Vouchers,
        Resource::VoucherBatches,
        Resource::IpBindings,
        Resource::Advertisements,
        Resource::LogArchives,
    ];

    /// Path relative to the API base.
    #[must_use]
    pub const fn endpoint(&self) -> &'static str {
        match *self {
            Self::Organizations => "/organizations",
            Self::Users => "/users",
            Self::Nas => "/nas",
            Self::RadiusProfiles => "/radius-profiles",
            Self::Packages => "/packages",
            Self::Vouchers => "/vouchers",
            Self::VoucherBatches => "/vouchers/batches",
            Self::IpBindings => "/ip-bindings",
            Self::Advertisements => "/advertisements",
            Self::LogArchives => "/logs/archives",
        }
    }

    /// Name used on the command line.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match *self {
            Self::Organizations => "organizations",
            Self::Users => "users",
            Self::Nas => "nas",
            Self::RadiusProfiles => "profiles",
            Self::Packages => "packages",
            Self::Vouchers => "vouchers",
            Self::VoucherBatches => "voucher-batches",
            Self::IpBindings => "ip-bindings",
            Self::Advertisements => "ads",
            Self::LogArchives => "log-archives",
        }
    }

    /// Path of a single record.
    #[must_use]
    pub fn item_path(&self, id: &str) -> String {
        format!("{}/{}", self.endpoint(), id.trim_matches('/'))
    }

    /// Console page listing this resource.
    #[must_use]
    pub const fn route(&self) -> Route {
        match *self {
            Self::Organizations => Route::Organizations,
            Self::Users => Route::Users,
            Self::Nas => Route::Nas,
            Self::RadiusProfiles => Route::RadiusProfiles,
            Self::Packages => Route::Packages,
            Self::Vouchers | Self::VoucherBatches => Route::Vouchers,
            Self::IpBindings => Route::IpBindings,
            Self::Advertisements => Route::Advertisements,
            Self::LogArchives => Route::LogArchives,
        }
    }

    /// Only meaningful while the backend runs in MikroTik mode.
    #[must_use]
    pub const fn requires_mikrotik(&self) -> bool {
        matches!(self, Self::IpBindings)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        let alias = match wanted.as_str() {
            "orgs" | "organization" => "organizations",
            "user" => "users",
            "radius-profiles" | "profile" => "profiles",
            "voucher" => "vouchers",
            "batches" => "voucher-batches",
            "bindings" | "ip-binding" => "ip-bindings",
            "advertisements" | "ad" => "ads",
            "logs" | "archives" => "log-archives",
            other => other,
        };
        Self::ALL.iter().copied().find(|r| r.name() == alias).ok_or_else(|| {
            let known: Vec<_> = Self::ALL.iter().map(Resource::name).collect();
            CoreError::InvalidInput(format!("unknown resource {s}; expected one of {}", known.join("|")))
        })
    }
}
